//! wiseguy's command-line entry point.
//! Loads a template file, renders it with the given JSON input and prints
//! the markup.

use std::sync::Arc;

use wiseguy::{
    cli::{get_args, Args},
    config::load_template,
    error::{default_error_handler, Result},
    logger::init_logger,
    renderer::{ContentRenderer, MiniJinjaRenderer},
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads the template file, following `extends` chains
/// 2. Reads the JSON input
/// 3. Renders and prints the markup
/// 4. Warns about transforms that never received their inputs
fn run(args: Args) -> Result<()> {
    let renderer: Arc<dyn ContentRenderer> = Arc::new(MiniJinjaRenderer::new());
    let template = load_template(&args.template, &renderer)?;
    let input = args.read_input()?;

    let report = template.render_report(&input)?;
    print!("{}", report.markup(!args.compact));
    if args.compact {
        println!();
    }

    for pending in &report.pending {
        log::warn!(
            "Transform '{}' did not run, missing: {}",
            pending.label,
            pending.missing.join(", ")
        );
        if args.report {
            eprintln!("pending: {} (missing {})", pending.label, pending.missing.join(", "));
        }
    }
    Ok(())
}
