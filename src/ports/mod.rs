/// Ports module defining interfaces for hexagonal architecture
///
/// The application core only talks to the outside world (providers,
/// converter, object store, analytical database, console) through these
/// outbound ports.
pub mod outbound;
