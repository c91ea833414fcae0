use std::path::PathBuf;
use std::time::Duration;

use packsync_core::config::parse_config_str;
use packsync_core::context::DeployContext;
use packsync_core::deploy::PipelineOptions;
use packsync_core::reconcile::RemovalPolicy;

const CONFIG: &str = r#"
[paths]
source_repository = "/srv/modpack"
server_root = "/srv/minecraft"

[docker]
container_name = "minecraft"

[deploy]
shutdown_notice_secs = 45

[minecraft]
extra_folders = ["scripts"]
"#;

#[test]
fn context_without_webhook_disables_notifications() {
    let config = parse_config_str(CONFIG).unwrap();
    let context = DeployContext::from_config(&config).unwrap();
    assert!(context.notifier.is_none());
}

#[test]
fn context_with_webhook_enables_notifications() {
    let toml = format!(
        "{}\n[notify]\nwebhook_url = \"https://chat.example.invalid/api/webhooks/1/token\"\n",
        CONFIG
    );
    let config = parse_config_str(&toml).unwrap();
    let context = DeployContext::from_config(&config).unwrap();
    assert!(context.notifier.is_some());
}

#[test]
fn invalid_webhook_url_is_a_config_error() {
    let toml = format!("{}\n[notify]\nwebhook_url = \"not a url\"\n", CONFIG);
    assert!(parse_config_str(&toml).is_err());
}

#[test]
fn pipeline_options_follow_config() {
    let config = parse_config_str(CONFIG).unwrap();
    let options = PipelineOptions::from_config(&config);

    assert_eq!(options.branch, "master");
    assert_eq!(options.service_name, "minecraft");
    assert_eq!(options.shutdown_notice, Duration::from_secs(45));
    assert_eq!(options.removal_policy, RemovalPolicy::Exact);
    assert_eq!(
        options.manifest_path,
        PathBuf::from("/srv/modpack/manifest.json")
    );
    assert_eq!(options.content_dir, PathBuf::from("/srv/minecraft/mods"));
    assert_eq!(
        options.managed_folders,
        vec!["config", "defaultconfigs", "kubejs", "scripts"]
    );
    assert_eq!(
        options.properties_path,
        Some(PathBuf::from("/srv/minecraft/server.properties"))
    );
}

#[test]
fn pipeline_options_skip_motd_when_disabled() {
    let toml = CONFIG.replace(
        "[minecraft]\n",
        "[minecraft]\nset_motd = false\n",
    );
    let config = parse_config_str(&toml).unwrap();
    assert!(PipelineOptions::from_config(&config).properties_path.is_none());
}
