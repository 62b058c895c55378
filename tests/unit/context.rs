use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "reelwright_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn config_in(dir: &Path, keep: bool) -> RunConfig {
    RunConfig {
        scratch_dir: Some(dir.to_path_buf()),
        keep_scratch: keep,
        seed: Some(11),
        ..RunConfig::default()
    }
}

#[test]
fn scratch_is_removed_on_drop() {
    let root = temp_dir("ctx_drop");
    let ctx = RunContext::with_narrators(&config_in(&root, false), "mesh", Vec::new()).unwrap();
    let scratch = ctx.scratch().path().to_path_buf();
    assert!(scratch.starts_with(&root));
    assert!(scratch.is_dir());
    let sub = ctx.scratch().subdir("audio").unwrap();
    assert!(sub.is_dir());
    drop(ctx);
    assert!(!scratch.exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn kept_scratch_survives_drop() {
    let root = temp_dir("ctx_keep");
    let ctx = RunContext::with_narrators(&config_in(&root, true), "mesh", Vec::new()).unwrap();
    let scratch = ctx.scratch().path().to_path_buf();
    drop(ctx);
    assert!(scratch.is_dir());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn runs_get_distinct_ids_and_scratch_dirs() {
    let root = temp_dir("ctx_ids");
    let a = RunContext::with_narrators(&config_in(&root, false), "mesh", Vec::new()).unwrap();
    let b = RunContext::with_narrators(&config_in(&root, false), "mesh", Vec::new()).unwrap();
    assert_ne!(a.run_id(), b.run_id());
    assert_ne!(a.scratch().path(), b.scratch().path());
    assert_eq!(a.run_id().len(), 16);
    drop((a, b));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn fixed_seed_gives_reproducible_rng() {
    use rand::Rng;
    let root = temp_dir("ctx_seed");
    let mut a = RunContext::with_narrators(&config_in(&root, false), "mesh", Vec::new()).unwrap();
    let mut b = RunContext::with_narrators(&config_in(&root, false), "vrishabh", Vec::new()).unwrap();
    let xs: Vec<u32> = (0..4).map(|_| a.rng.r#gen()).collect();
    let ys: Vec<u32> = (0..4).map(|_| b.rng.r#gen()).collect();
    assert_eq!(xs, ys);
    drop((a, b));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn configured_commands_become_the_chain() {
    let root = temp_dir("ctx_chain");
    let mut cfg = config_in(&root, false);
    cfg.narrators = serde_json::from_str(
        r#"[{"name":"primary","program":"tts-a"},{"name":"backup","program":"tts-b"}]"#,
    )
    .unwrap();
    let mut ctx = RunContext::from_config(&cfg, "mesh").unwrap();
    assert_eq!(ctx.chain.current().map(|n| n.name().to_string()).as_deref(), Some("primary"));
    ctx.chain.advance();
    assert_eq!(ctx.chain.current().map(|n| n.name().to_string()).as_deref(), Some("backup"));
    drop(ctx);
    let _ = std::fs::remove_dir_all(&root);
}
