use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, session::Session, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let session = Session::open(&args.source, &args.filters)?;
    let limit = args.rows.unwrap_or(session.settings.preview_rows);
    let head = session.analyzer.table().head(limit);
    table::print_table(&head.headers(), &head.display_rows());
    info!(
        "Displayed {} of {} row(s)",
        head.len(),
        session.analyzer.table().len()
    );
    Ok(())
}
