use crate::error::CliError;
use engine_config::catalog::Catalog;
use model::execution::report::MigrationReport;
use std::path::Path;

fn report_json(report: &MigrationReport) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub async fn write_report(report: &MigrationReport, path: &Path) -> Result<(), CliError> {
    let json = report_json(report)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| CliError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })
}

pub fn print_summary(report: &MigrationReport) {
    println!("{}", report.render_summary());
}

pub fn render_catalog(catalog: &Catalog) -> String {
    catalog
        .tables()
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            format!(
                "{:>2}. {:<16} {} -> {} ({} columns, {:?})\n",
                i + 1,
                spec.name,
                spec.source.table,
                spec.destination,
                spec.columns.len(),
                spec.mode
            )
        })
        .collect()
}

pub fn print_catalog(catalog: &Catalog, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", catalog.to_json()?);
    } else {
        print!("{}", render_catalog(catalog));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::identifiers::RunId,
        execution::report::{RunState, TableOutcome},
    };
    use std::time::Duration;

    #[tokio::test]
    async fn report_file_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = MigrationReport {
            run_id: RunId::new("r1"),
            outcomes: vec![TableOutcome::failed(
                "products",
                "",
                "Destination table shop.products does not exist".into(),
            )],
            duration: Duration::from_millis(20),
            state: RunState::Halted,
            interrupted: false,
        };

        write_report(&report, &path).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["run_id"], "r1");
        assert_eq!(json["state"], "Halted");
        assert_eq!(json["outcomes"][0]["name"], "products");
    }

    #[test]
    fn catalog_listing_is_in_run_order() {
        let listing = render_catalog(&Catalog::builtin());
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("users") && lines[0].contains("auth.users -> auth.users"));
        assert!(lines[4].contains("public.user_roles -> auth.user_roles"));
        assert!(lines[4].contains("SkipExisting"));
    }
}
