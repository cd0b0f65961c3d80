//! Run the shipping-method function locally.
//!
//! # Usage
//!
//! ```bash
//! # Same contract as the checkout sandbox: JSON in on stdin, JSON out on stdout
//! dutchned-cli function shipping-method < input.json
//!
//! # Read from a file instead
//! dutchned-cli function shipping-method --input input.json
//! ```

use std::io::Read;
use std::path::Path;

use dutchned_core::shipping;

use super::CommandError;

/// Read the function input and print the operations it produces.
///
/// Unreadable JSON is not an error: like in the sandbox it yields an empty
/// operation list.
///
/// # Errors
///
/// Returns an error if the input cannot be read or the output written.
pub fn shipping_method(input: Option<&Path>) -> Result<(), CommandError> {
    let raw = read_input(input)?;
    let result = shipping::run_json(&raw);

    tracing::debug!(
        operations = result.operations.len(),
        "Shipping-method function finished"
    );

    super::print_json(&result)
}

/// Read `path`, or stdin when no path is given.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String, CommandError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}
