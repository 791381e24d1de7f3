//! Prints the OpenAPI document as pretty JSON.

use anyhow::Context;
use ciceron_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let doc = ApiDoc::openapi();
    let json = doc
        .to_pretty_json()
        .context("failed to render OpenAPI document")?;
    println!("{json}");
    Ok(())
}
