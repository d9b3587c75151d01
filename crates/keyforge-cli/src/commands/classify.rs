//! Classify command
//!
//! Usage: keyforge classify <TEMPLATE>

use clap::Args;
use keyforge_core::template::classify;

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Key template to inspect
    pub template: String,
}

/// Execute classify command
pub fn execute(args: ClassifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.template.trim().is_empty() {
        return Err("template is empty".into());
    }
    println!("{}", classify(&args.template));
    Ok(())
}
