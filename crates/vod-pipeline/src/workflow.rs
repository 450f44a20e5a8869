//! Per-video conversion workflow.

use std::path::Path;

use chrono::Utc;
use tracing::{error, info, warn};

use vod_media::move_dir;
use vod_models::Video;
use vod_store::StoreError;

use crate::error::PipelineResult;
use crate::pipeline::JobContext;

/// Run the whole workflow for one slug. Never returns an error: outcomes are
/// recorded on the video record and logged, so one job cannot take the
/// dispatcher down with it.
pub(crate) async fn process(ctx: &JobContext, slug: &str) {
    let video = match ctx.repo.get_by_slug(slug).await {
        Ok(video) => video,
        Err(StoreError::NotFound) => {
            // Lost job: nothing to transition, nothing to retry.
            warn!(slug, "enqueued slug has no video record, dropping job");
            return;
        }
        Err(e) => {
            error!(slug, error = %e, "failed to resolve enqueued slug");
            return;
        }
    };

    let scratch_root = ctx.config.work_dir.join(slug);
    let outcome = convert(ctx, &video, &scratch_root).await;

    // Guaranteed cleanup on every exit path.
    if let Err(e) = tokio::fs::remove_dir_all(&scratch_root).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(slug, error = %e, "failed to remove scratch directory");
        }
    }

    match outcome {
        Ok(()) => info!(slug, "conversion succeeded"),
        Err(e) => error!(slug, error = %e, "conversion failed"),
    }
}

async fn convert(ctx: &JobContext, video: &Video, scratch_root: &Path) -> PipelineResult<()> {
    ctx.repo.set_processing(&video.id, Utc::now()).await?;

    let date_path = video.date_path();
    let input = ctx
        .config
        .raw_dir
        .join(&date_path)
        .join(&video.slug)
        .join(video.source_name());
    let out_dir = scratch_root.join("hls");

    if let Err(e) = tokio::fs::create_dir_all(&out_dir).await {
        mark_interrupted(ctx, video, &e.to_string()).await;
        return Err(e.into());
    }

    if let Err(e) = ctx.packager.package(&input, &out_dir).await {
        mark_interrupted(ctx, video, &e.to_string()).await;
        return Err(e.into());
    }

    let dest = ctx
        .config
        .converted_dir
        .join(&date_path)
        .join(&video.slug);
    if let Err(e) = move_dir(&out_dir, &dest).await {
        error!(
            slug = %video.slug,
            from = %out_dir.display(),
            to = %dest.display(),
            error = %e,
            "moving artifacts failed"
        );
        mark_interrupted(ctx, video, &e.to_string()).await;
        return Err(e.into());
    }

    ctx.repo.set_ready(&video.id, Utc::now()).await?;
    Ok(())
}

async fn mark_interrupted(ctx: &JobContext, video: &Video, reason: &str) {
    if let Err(e) = ctx.repo.set_interrupted(&video.id, reason).await {
        error!(slug = %video.slug, error = %e, "failed to mark video interrupted");
    }
}
