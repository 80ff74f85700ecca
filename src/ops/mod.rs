pub mod check;
pub mod gesture;
pub mod partition;
pub mod reconcile;
