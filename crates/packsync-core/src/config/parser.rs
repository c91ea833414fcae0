//! TOML parser with helpful error messages

use super::schema::DeployConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Load and validate a deployment configuration file
pub fn load_config(path: &Path) -> Result<DeployConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse configuration content from string
pub fn parse_config_str(content: &str) -> Result<DeployConfig> {
    let config: DeployConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Enhance TOML parsing errors with helpful context
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.to_string();

    let line_hint = match error.span() {
        Some(span) => Some(content[..span.start.min(content.len())].matches('\n').count() + 1),
        None => error_msg
            .lines()
            .find(|line| line.contains("line "))
            .and_then(|line| {
                line.split("line ")
                    .nth(1)
                    .and_then(|s| s.split_whitespace().next())
                    .and_then(|s| s.parse::<usize>().ok())
            }),
    };

    if let Some(line_num) = line_hint {
        let context = get_line_context(content, line_num);
        anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            context,
            error_msg
        )
    } else {
        anyhow::anyhow!("TOML parsing error: {}", error_msg)
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 2).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::RemovalPolicy;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[paths]
source_repository = "/srv/modpack"
server_root = "/srv/minecraft"

[docker]
container_name = "minecraft"
"#;

    #[test]
    fn test_parse_minimal_config_applies_defaults() {
        let config = parse_config_str(MINIMAL).unwrap();

        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.git.branch, "master");
        assert_eq!(config.docker.binary, "docker");
        assert_eq!(config.docker.admin_command, "rcon-cli");
        assert_eq!(config.deploy.shutdown_notice_secs, 30);
        assert_eq!(config.deploy.removal_policy, RemovalPolicy::Exact);
        assert!(config.minecraft.set_motd);
        assert_eq!(config.network.timeout_secs, 30);
        assert!(config.notify.webhook_url.is_none());
        assert!(config.webhook_url().unwrap().is_none());

        assert_eq!(
            config.manifest_path(),
            PathBuf::from("/srv/modpack/manifest.json")
        );
        assert_eq!(
            config.state_path(),
            PathBuf::from("/srv/minecraft/installed-manifest.json")
        );
        assert_eq!(config.content_dir(), PathBuf::from("/srv/minecraft/mods"));
        assert_eq!(
            config.properties_path(),
            PathBuf::from("/srv/minecraft/server.properties")
        );
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[paths]
source_repository = "/srv/modpack"
server_root = "/srv/minecraft"
manifest_file = "pack/manifest.json"
state_file = "state/installed.json"

[git]
remote = "upstream"
branch = "release"

[docker]
container_name = "mc"
binary = "podman"
admin_command = "mc-send-to-console"

[deploy]
shutdown_notice_secs = 60
removal_policy = "count-heuristic"

[minecraft]
set_motd = false
content_folder = "plugins"
extra_folders = ["scripts", "config"]

[curseforge]
api_base = "https://cf.example.invalid"
api_key = "abc"

[network]
timeout_secs = 5

[notify]
webhook_url = "https://discord.example.invalid/api/webhooks/1/x"
"#;

        let config = parse_config_str(toml).unwrap();
        assert_eq!(config.git.remote, "upstream");
        assert_eq!(config.git.branch, "release");
        assert_eq!(config.docker.binary, "podman");
        assert_eq!(config.deploy.removal_policy, RemovalPolicy::CountHeuristic);
        assert!(!config.minecraft.set_motd);
        assert_eq!(config.content_dir(), PathBuf::from("/srv/minecraft/plugins"));
        assert_eq!(config.api_key().as_deref(), Some("abc"));
        assert_eq!(config.timeout().as_secs(), 5);
        assert_eq!(
            config.webhook_url().unwrap().unwrap().host_str(),
            Some("discord.example.invalid")
        );
        assert_eq!(
            config.managed_folders(),
            vec!["config", "defaultconfigs", "kubejs", "scripts"]
        );
    }

    #[test]
    fn test_managed_folders_never_include_content_folder() {
        let toml = format!(
            "{}\n[minecraft]\ncontent_folder = \"kubejs\"\nextra_folders = [\"mods\", \"kubejs\"]\n",
            MINIMAL
        );
        let config = parse_config_str(&toml).unwrap();
        assert_eq!(config.managed_folders(), vec!["config", "defaultconfigs", "mods"]);
    }

    #[test]
    fn test_missing_required_section() {
        let toml = r#"
[paths]
source_repository = "/srv/modpack"
server_root = "/srv/minecraft"
"#;
        let err = parse_config_str(toml).unwrap_err().to_string();
        assert!(err.contains("docker"), "unexpected error: {err}");
    }

    #[test]
    fn test_rejects_traversal_in_managed_folders() {
        let toml = format!("{}\n[minecraft]\nextra_folders = [\"../etc\"]\n", MINIMAL);
        let err = format!("{:#}", parse_config_str(&toml).unwrap_err());
        assert!(err.contains("Path traversal"), "unexpected error: {err}");
    }

    #[test]
    fn test_rejects_managed_folder_aliases() {
        for folder in [".", "./mods", "mods/", "config/nested"] {
            let toml = format!(
                "{}\n[minecraft]\nextra_folders = [\"{}\"]\n",
                MINIMAL, folder
            );
            let err = format!("{:#}", parse_config_str(&toml).unwrap_err());
            assert!(
                err.contains("single plain name"),
                "{folder}: unexpected error: {err}"
            );
        }
    }

    #[test]
    fn test_rejects_nested_content_folder() {
        let toml = format!("{}\n[minecraft]\ncontent_folder = \"./mods\"\n", MINIMAL);
        let err = format!("{:#}", parse_config_str(&toml).unwrap_err());
        assert!(err.contains("content_folder"), "unexpected error: {err}");
    }

    #[test]
    fn test_rejects_absolute_content_folder() {
        let toml = format!("{}\n[minecraft]\ncontent_folder = \"/mods\"\n", MINIMAL);
        let err = format!("{:#}", parse_config_str(&toml).unwrap_err());
        assert!(err.contains("Absolute paths"), "unexpected error: {err}");
    }

    #[test]
    fn test_rejects_empty_container_name() {
        let toml = MINIMAL.replace("\"minecraft\"\n", "\"\"\n");
        let err = parse_config_str(&toml).unwrap_err().to_string();
        assert!(err.contains("container_name"), "unexpected error: {err}");
    }

    #[test]
    fn test_rejects_invalid_removal_policy() {
        let toml = format!("{}\n[deploy]\nremoval_policy = \"sometimes\"\n", MINIMAL);
        assert!(parse_config_str(&toml).is_err());
    }

    #[test]
    fn test_enhance_toml_error() {
        let toml = "[paths]\nsource_repository = [unclosed\n";
        let err = parse_config_str(toml).unwrap_err().to_string();
        assert!(err.contains("TOML parsing error at line 2"), "unexpected error: {err}");
        assert!(err.contains(">>>"));
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", MINIMAL).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.docker.container_name, "minecraft");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config(Path::new("/nonexistent/path/packsync.toml"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file"));
    }
}
