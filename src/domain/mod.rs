// Domain layer: build models and the notifier port. No I/O here.

pub mod model;
pub mod ports;
