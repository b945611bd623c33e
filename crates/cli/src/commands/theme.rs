use std::path::Path;

use forja_core::{FragmentStore, ThemeAssembler};

use super::CommandContext;

/// Print the merged, validated theme as JSON.
pub(crate) async fn cmd_theme(ctx: &CommandContext<'_>, draft_path: &Path) {
    let config = ctx.load_config();
    let draft = ctx.load_draft(draft_path);
    if let Err(e) = draft.validate() {
        ctx.fail(&e.to_string());
    }

    let assembler = match ThemeAssembler::new(
        FragmentStore::new(&config.fragments_dir),
        config.base_fragment.clone(),
    ) {
        Ok(a) => a,
        Err(e) => ctx.fail(&e.to_string()),
    };
    let theme = match assembler.assemble(&draft.theme).await {
        Ok(t) => t,
        Err(e) => ctx.fail(&e.to_string()),
    };

    match serde_json::to_string_pretty(theme.as_value()) {
        Ok(text) => println!("{}", text),
        Err(e) => ctx.fail(&format!("could not serialize theme: {}", e)),
    }
}
