/// Network adapters for upstream providers, object storage and the analytical database
pub mod clickhouse_sink;
pub mod github_client;
pub mod http_client;
pub mod mend_client;
pub mod retry;
pub mod s3_object_store;
pub mod wiz_client;

pub use clickhouse_sink::{ClickHouseSettings, ClickHouseSink};
pub use github_client::{GitHubSbomClient, GitHubSettings};
pub use mend_client::{MendSbomClient, MendScope, MendSettings};
pub use retry::RetryPolicy;
pub use s3_object_store::{AwsCredentials, S3ObjectStore, S3Settings};
pub use wiz_client::{WizSbomClient, WizSettings};
