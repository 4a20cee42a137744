//! veil-replay
//!
//! Replays a JSON event script through a protected viewer and prints the
//! report as JSON.
//!
//! ```text
//! veil-replay <script.json>
//! ```

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    veil_core::init_logging();

    let path = std::env::args()
        .nth(1)
        .context("usage: veil-replay <script.json>")?;

    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let script = veil_runtime::ReplayScript::from_json(&raw)?;
    let report = veil_runtime::replay(&script)?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
