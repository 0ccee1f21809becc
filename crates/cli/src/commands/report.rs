//! Report commands.

use tienda_storefront::api::ApiClient;

use super::CommandError;
use crate::output;

/// Print the top-selling products report.
///
/// # Errors
///
/// Returns an error if the report cannot be fetched.
pub async fn top_selling(api: &ApiClient) -> Result<(), CommandError> {
    let entries = api.top_selling_report().await?;
    output::print(&output::top_selling(&entries));
    Ok(())
}
