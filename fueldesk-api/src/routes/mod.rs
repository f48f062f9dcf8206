/// Plain HTTP route handlers
///
/// - `health`: Health check endpoint

pub mod health;
