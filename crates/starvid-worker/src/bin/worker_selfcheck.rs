use std::path::Path;
use std::process::Command;

use starvid_media::RenderConfig;
use starvid_worker::{BackendConfig, StateBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let render = RenderConfig::from_env();
    let backends = BackendConfig::from_env()?;

    println!(
        "worker-selfcheck: starting with videos_dir={} backend={:?}",
        render.output_dir.display(),
        backends.backend
    );
    ensure_videos_dir(&render.output_dir).await?;
    ensure_ffmpeg()?;
    if backends.backend == StateBackend::Redis {
        ensure_env_present(&["REDIS_URL"])?;
    }
    if let Some(font) = &render.font_file {
        if !font.is_file() {
            anyhow::bail!("RENDER_FONT_FILE {} does not exist", font.display());
        }
    }

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_videos_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;

    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("{} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_ffmpeg() -> anyhow::Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "ffmpeg -version failed: {:?}",
            output.status
        ));
    }
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
