// Command handlers, one module per subcommand

pub mod discopop;
pub mod doctor;
pub mod hotspots;
pub mod optimize;
pub mod patch;
pub mod results;
pub mod steps;
