//! `MediaCompiler` backed by the system `ffmpeg` binary.
//!
//! The whole job becomes one invocation: every scene is built as its own video/audio pair
//! from looped stills (or an image sequence), the pairs are concatenated, narration is mixed
//! with the music bed, and the tail fade and watermark are applied last.

use std::{
    io::Read as _,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    assets::media::{MIX_SAMPLE_RATE, is_ffmpeg_on_path},
    compose::layer::VisualSource,
    encode::job::{MediaCompiler, MediaJob, Watermark, ensure_parent_dir},
    foundation::error::{ReelError, ReelResult},
};

fn format_time(value: f64) -> String {
    format!("{value:.6}")
}

fn escape_with(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a literal filter option value for use inside `-filter_complex`.
///
/// ffmpeg unescapes twice: the graph parser first (`[ ] , ;` and quoting), then the
/// filter's `key=value` parser (`:` and quoting). The inner level is applied first.
fn escape_option_value(s: &str) -> String {
    let option_level = escape_with(s, &['\\', '\'', ':']);
    escape_with(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

#[derive(Debug, Default)]
struct Inputs {
    args: Vec<String>,
    count: usize,
}

impl Inputs {
    fn still(&mut self, path: &Path, fps: f64, secs: f64) -> usize {
        self.args.extend([
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            format!("{fps}"),
            "-t".to_string(),
            format_time(secs),
            "-i".to_string(),
            path.to_string_lossy().into_owned(),
        ]);
        self.next()
    }

    fn sequence(&mut self, dir: &Path, pattern: &str, fps: f64) -> usize {
        self.args.extend([
            "-framerate".to_string(),
            format!("{fps}"),
            "-start_number".to_string(),
            "0".to_string(),
            "-i".to_string(),
            dir.join(pattern).to_string_lossy().into_owned(),
        ]);
        self.next()
    }

    fn audio(&mut self, path: &Path, looped: bool) -> usize {
        if looped {
            self.args.extend(["-stream_loop".to_string(), "-1".to_string()]);
        }
        self.args
            .extend(["-i".to_string(), path.to_string_lossy().into_owned()]);
        self.next()
    }

    fn next(&mut self) -> usize {
        self.count += 1;
        self.count - 1
    }
}

/// Full ffmpeg argument list for `job` (without the program name).
pub fn build_ffmpeg_args(job: &MediaJob) -> ReelResult<Vec<String>> {
    job.settings.validate()?;
    if job.segments.is_empty() {
        return Err(ReelError::assembly_empty("media job has no segments"));
    }

    let s = &job.settings;
    let (w, h) = (s.canvas.width, s.canvas.height);
    let fps = s.fps.as_f64();
    let fps_expr = format!("{}/{}", s.fps.num, s.fps.den);
    let total = job.total_secs();

    let mut inputs = Inputs::default();
    let mut filters: Vec<String> = Vec::new();
    let mut concat_inputs = String::new();

    for (si, seg) in job.segments.iter().enumerate() {
        let dur = format_time(seg.duration_secs);
        let mut label = format!("s{si}base");
        filters.push(format!("color=c=black:s={w}x{h}:r={fps_expr}:d={dur}[{label}]"));

        for (li, layer) in seg.layers.iter().enumerate() {
            let Some(window) = layer.window.clipped_to(seg.duration_secs) else {
                continue;
            };
            let (idx, prep) = match &layer.source {
                VisualSource::Still { path } => (
                    inputs.still(path, fps, seg.duration_secs),
                    "format=rgba,setpts=PTS-STARTPTS".to_string(),
                ),
                VisualSource::Sequence {
                    dir, pattern, fps: seq_fps, ..
                } => (
                    inputs.sequence(dir, pattern, seq_fps.as_f64()),
                    format!("fps={fps_expr},scale={w}:{h},format=rgba,setpts=PTS-STARTPTS"),
                ),
            };
            let layer_label = format!("s{si}l{li}");
            filters.push(format!("[{idx}:v]{prep}[{layer_label}]"));
            let out_label = format!("s{si}o{li}");
            filters.push(format!(
                "[{label}][{layer_label}]overlay=x={}:y={}:eof_action=pass:enable='gte(t,{})*lt(t,{})'[{out_label}]",
                layer.x,
                layer.y,
                format_time(window.start),
                format_time(window.end),
            ));
            label = out_label;
        }

        let mut tail = String::new();
        if seg.fade_in_secs > 0.0 {
            tail.push_str(&format!("fade=t=in:st=0:d={},", format_time(seg.fade_in_secs)));
        }
        filters.push(format!(
            "[{label}]{tail}trim=duration={dur},setpts=PTS-STARTPTS,format=yuv420p[v{si}]"
        ));

        match &seg.audio {
            Some(path) => {
                let idx = inputs.audio(path, false);
                filters.push(format!(
                    "[{idx}:a]aformat=sample_fmts=fltp:sample_rates={MIX_SAMPLE_RATE}:channel_layouts=stereo,apad=whole_dur={dur},atrim=duration={dur},asetpts=PTS-STARTPTS[a{si}]"
                ));
            }
            None => filters.push(format!(
                "anullsrc=r={MIX_SAMPLE_RATE}:cl=stereo,aformat=sample_fmts=fltp:sample_rates={MIX_SAMPLE_RATE}:channel_layouts=stereo,atrim=duration={dur},asetpts=PTS-STARTPTS[a{si}]"
            )),
        }
        concat_inputs.push_str(&format!("[v{si}][a{si}]"));
    }

    filters.push(format!(
        "{concat_inputs}concat=n={}:v=1:a=1[catv][cata]",
        job.segments.len()
    ));

    let mut video = "catv".to_string();
    if let Some(wm) = job.watermark.as_ref().filter(|w| !w.text.trim().is_empty()) {
        filters.push(drawtext_filter(&video, wm, "wmv"));
        video = "wmv".to_string();
    }

    let mut audio = "cata".to_string();
    if let Some(music) = &job.music {
        let idx = inputs.audio(&music.path, true);
        filters.push(format!(
            "[{idx}:a]aformat=sample_fmts=fltp:sample_rates={MIX_SAMPLE_RATE}:channel_layouts=stereo,atrim=duration={},asetpts=PTS-STARTPTS,volume={:.4}[bgm]",
            format_time(total),
            music.gain,
        ));
        filters.push(format!(
            "[{audio}][bgm]amix=inputs=2:duration=first:normalize=0:dropout_transition=0[mixa]"
        ));
        audio = "mixa".to_string();
    }

    let (mut vtail, mut atail) = (String::new(), String::new());
    if let Some(fade) = job.fade_out {
        let st = format_time(fade.start_secs);
        let d = format_time(fade.duration_secs);
        vtail = format!("fade=t=out:st={st}:d={d},");
        atail = format!("afade=t=out:st={st}:d={d},");
    }
    filters.push(format!("[{video}]{vtail}null[outv]"));
    filters.push(format!("[{audio}]{atail}anull[outa]"));

    let mut args = vec![
        (if s.overwrite { "-y" } else { "-n" }).to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];
    args.extend(inputs.args);
    args.extend([
        "-filter_complex".to_string(),
        filters.join(";"),
        "-map".to_string(),
        "[outv]".to_string(),
        "-map".to_string(),
        "[outa]".to_string(),
        "-r".to_string(),
        fps_expr,
        "-c:v".to_string(),
        s.video_codec.clone(),
        "-preset".to_string(),
        s.preset.clone(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        s.audio_codec.clone(),
        "-b:a".to_string(),
        s.audio_bitrate.clone(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-t".to_string(),
        format_time(total),
        job.out_path.to_string_lossy().into_owned(),
    ]);
    Ok(args)
}

// `expansion=none` keeps `%` literal in the text.
fn drawtext_filter(input: &str, wm: &Watermark, output: &str) -> String {
    format!(
        "[{input}]drawtext=text={}:expansion=none:font={}:fontsize={}:fontcolor=white@{:.2}:x=w-tw-40:y=48:shadowcolor=black@0.5:shadowx=2:shadowy=2[{output}]",
        escape_option_value(&wm.text),
        escape_option_value(&wm.font_family),
        wm.font_size,
        wm.opacity.clamp(0.0, 1.0),
    )
}

/// Runs `ffmpeg` for each job.
#[derive(Clone, Debug)]
pub struct FfmpegCompiler {
    program: PathBuf,
}

impl Default for FfmpegCompiler {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegCompiler {
    /// Compiler using a specific ffmpeg binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl MediaCompiler for FfmpegCompiler {
    #[tracing::instrument(skip_all, fields(out = %job.out_path.display(), segments = job.segments.len()))]
    fn compile(&self, job: &MediaJob) -> ReelResult<PathBuf> {
        let args = build_ffmpeg_args(job)?;
        ensure_parent_dir(&job.out_path)?;
        if !job.settings.overwrite && job.out_path.exists() {
            return Err(ReelError::compiler(format!(
                "output file '{}' already exists",
                job.out_path.display()
            )));
        }
        if self.program == Path::new("ffmpeg") && !is_ffmpeg_on_path() {
            return Err(ReelError::compiler(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        tracing::debug!(argc = args.len(), "spawning ffmpeg");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelError::compiler(format!("failed to spawn ffmpeg: {e}")))?;

        // Drain stderr on a separate thread so a chatty ffmpeg cannot block on a full pipe.
        let stderr_thread = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf);
                buf
            })
        });

        let status = child
            .wait()
            .map_err(|e| ReelError::compiler(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = stderr_thread
            .and_then(|t| t.join().ok())
            .map(|b| String::from_utf8_lossy(&b).trim().to_string())
            .unwrap_or_default();

        if !status.success() {
            return Err(ReelError::compiler(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }
        if !job.out_path.is_file() {
            return Err(ReelError::compiler(format!(
                "ffmpeg succeeded but '{}' was not written",
                job.out_path.display()
            )));
        }
        tracing::info!(secs = job.total_secs(), "encoded output");
        Ok(job.out_path.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
