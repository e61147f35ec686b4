mod execute_bulk;

pub use execute_bulk::{BulkOperation, ExecuteBulkCommand, ExecuteBulkHandler, ExecuteBulkResult};
