//! Dumps the CleanOffice OpenAPI document as pretty JSON.
//!
//!   generate_openapi                  # to stdout
//!   generate_openapi -o openapi.json  # or --output

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clean_office_service::api::handlers::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, PartialEq)]
enum Target {
    Stdout,
    File(PathBuf),
}

fn parse_target(mut args: impl Iterator<Item = String>) -> Result<Target> {
    let mut target = Target::Stdout;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let path = args.next().with_context(|| format!("{arg} needs a path"))?;
                target = Target::File(path.into());
            }
            other => bail!("unexpected argument: {other}"),
        }
    }
    Ok(target)
}

fn main() -> Result<()> {
    let target = parse_target(std::env::args().skip(1))?;
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .context("serialising OpenAPI document")?;

    match target {
        Target::Stdout => io::stdout()
            .lock()
            .write_all(document.as_bytes())
            .context("writing OpenAPI document to stdout")?,
        Target::File(path) => {
            fs::write(&path, &document)
                .with_context(|| format!("writing OpenAPI document to {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Target> {
        parse_target(args.iter().map(|a| (*a).to_owned()))
    }

    #[test]
    fn no_arguments_means_stdout() {
        assert_eq!(parse(&[]).unwrap(), Target::Stdout);
    }

    #[test]
    fn output_flag_takes_a_path() {
        assert_eq!(
            parse(&["--output", "api.json"]).unwrap(),
            Target::File("api.json".into())
        );
        assert_eq!(parse(&["-o", "x.json"]).unwrap(), Target::File("x.json".into()));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(parse(&["--output"]).is_err());
        assert!(parse(&["--yaml"]).is_err());
    }

    #[test]
    fn document_lists_ingestion_route() {
        let document = ApiDoc::openapi().to_pretty_json().unwrap();
        assert!(document.contains("/api/v1/sensors/{sensor_id}/measurements"));
    }
}
