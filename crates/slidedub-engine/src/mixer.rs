//! Track mixing: place reconciled segments at absolute offsets on a silent
//! base track, batching to respect the mixer's input-count ceiling.

use std::path::Path;
use tracing::{debug, info};

use slidedub_media::{audio, FfmpegCommand, FfmpegRunner};
use slidedub_models::ReconciledSegment;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Delay offsets (milliseconds) for one batch of segments.
pub fn batch_delays(segments: &[ReconciledSegment]) -> Vec<u64> {
    segments
        .iter()
        .map(|r| (r.segment.start * 1000.0).round().max(0.0) as u64)
        .collect()
}

/// Build the filter graph for one mixing batch.
///
/// Input 0 is the silent base; inputs 1..=N are the segment artifacts. Each
/// segment is delayed to its absolute start, then everything is additively
/// mixed with `duration=first` so the base track's length wins. Mixing is
/// not normalized; overlapping segments sum.
pub fn build_batch_graph(delays_ms: &[u64]) -> String {
    let mut parts = Vec::with_capacity(delays_ms.len() + 1);

    for (i, delay) in delays_ms.iter().enumerate() {
        parts.push(format!("[{}:a]adelay={}|{}[d{}]", i + 1, delay, delay, i));
    }

    let mut mix_inputs = String::from("[0:a]");
    for i in 0..delays_ms.len() {
        mix_inputs.push_str(&format!("[d{}]", i));
    }
    parts.push(format!(
        "{}amix=inputs={}:duration=first:dropout_transition=0:normalize=0[out]",
        mix_inputs,
        delays_ms.len() + 1
    ));

    parts.join(";")
}

/// Build the filter graph that merges batch outputs.
///
/// All batch tracks already span the full target duration, so `longest`
/// semantics keep them aligned.
pub fn build_merge_graph(batch_count: usize) -> String {
    let refs: String = (0..batch_count).map(|i| format!("[{}:a]", i)).collect();
    format!(
        "{}amix=inputs={}:duration=longest:dropout_transition=0:normalize=0[out]",
        refs, batch_count
    )
}

/// Mix reconciled segments into a single track of exactly `total_duration`
/// seconds.
///
/// Segments are partitioned into fixed-size batches, each mixed against its
/// own silent base; multiple batch outputs are merged afterwards. Batching
/// is invisible to the caller apart from floating-point mixing order at
/// batch boundaries, which is accepted and not canonicalized.
pub async fn mix_track(
    segments: &[ReconciledSegment],
    total_duration: f64,
    config: &EngineConfig,
    work_dir: &Path,
    output: impl AsRef<Path>,
) -> EngineResult<()> {
    let output = output.as_ref();

    if total_duration <= 0.0 {
        return Err(EngineError::input(format!(
            "cannot mix a track of duration {:.3}s",
            total_duration
        )));
    }

    if segments.is_empty() {
        info!("No segments to mix, producing a silent track");
        audio::create_silence(total_duration, &config.render, output).await?;
        return Ok(());
    }

    let batch_size = config.mix_batch_size.max(1);
    let batches: Vec<&[ReconciledSegment]> = segments.chunks(batch_size).collect();

    if batches.len() == 1 {
        run_batch(batches[0], total_duration, config, output).await?;
        info!(
            segments = segments.len(),
            duration = format!("{:.1}s", total_duration),
            "Mixed track in a single batch"
        );
        return Ok(());
    }

    let mut batch_outputs = Vec::with_capacity(batches.len());
    for (i, batch) in batches.iter().enumerate() {
        let batch_out = work_dir.join(format!("batch_{:04}.wav", i));
        if batch_out.exists() {
            debug!(batch = i, "Batch track cached");
        } else {
            run_batch(batch, total_duration, config, &batch_out).await?;
        }
        batch_outputs.push(batch_out);
    }

    let mut cmd = FfmpegCommand::new(output);
    for batch_out in &batch_outputs {
        cmd = cmd.input(batch_out);
    }
    cmd = cmd
        .filter_complex(build_merge_graph(batch_outputs.len()))
        .map("[out]")
        .duration(total_duration);
    FfmpegRunner::new().run(&cmd).await?;

    info!(
        segments = segments.len(),
        batches = batch_outputs.len(),
        duration = format!("{:.1}s", total_duration),
        "Mixed track from batches"
    );
    Ok(())
}

async fn run_batch(
    batch: &[ReconciledSegment],
    total_duration: f64,
    config: &EngineConfig,
    output: &Path,
) -> EngineResult<()> {
    let delays = batch_delays(batch);

    let mut cmd = FfmpegCommand::new(output).lavfi_input(format!(
        "{}:d={}",
        config.render.silence_source(),
        total_duration
    ));
    for r in batch {
        cmd = cmd.input(&r.artifact);
    }
    cmd = cmd
        .filter_complex(build_batch_graph(&delays))
        .map("[out]")
        .duration(total_duration);

    FfmpegRunner::new().run(&cmd).await?;
    Ok(())
}
