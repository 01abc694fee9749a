use std::path::Path;

use tracing::info;

use riskwatch_common::RiskWatchError;

/// Load the master entity list: one name per line, blank lines ignored,
/// order preserved. A missing file or an empty list is a configuration error.
pub fn load_entities(path: &Path) -> Result<Vec<String>, RiskWatchError> {
    let contents = read(path)?;
    let entities = parse_entities(&contents);
    if entities.is_empty() {
        return Err(RiskWatchError::Input(format!(
            "entity list {} contains no names",
            path.display()
        )));
    }
    info!(path = %path.display(), count = entities.len(), "Entity list loaded");
    Ok(entities)
}

pub fn parse_entities(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Load a prompt fragment (role/objective block or scoring rubric). Must be non-blank.
pub fn load_text(path: &Path) -> Result<String, RiskWatchError> {
    let contents = read(path)?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err(RiskWatchError::Input(format!("{} is empty", path.display())));
    }
    Ok(trimmed.to_string())
}

fn read(path: &Path) -> Result<String, RiskWatchError> {
    std::fs::read_to_string(path)
        .map_err(|e| RiskWatchError::Input(format!("cannot read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_skip_blank_lines_and_keep_order() {
        let parsed = parse_entities("  Zeta Ltd \n\nAlpha Inc\n   \nMid Co\n");
        assert_eq!(parsed, vec!["Zeta Ltd", "Alpha Inc", "Mid Co"]);
    }

    #[test]
    fn missing_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_entities(&dir.path().join("companies.txt")).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("companies.txt"));
    }

    #[test]
    fn blank_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definitions.txt");
        std::fs::write(&path, "\n  \n").unwrap();
        assert!(load_text(&path).unwrap_err().is_configuration());
        assert!(load_entities(&path).unwrap_err().is_configuration());
    }

    #[test]
    fn text_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "\nYou are an analyst.\n\n").unwrap();
        assert_eq!(load_text(&path).unwrap(), "You are an analyst.");
    }
}
