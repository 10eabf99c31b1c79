//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::types::{MediaProbe, TranscodeOutcome, TranscodeStrategy};
use super::Transcoder;

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds the fast-path arguments: strip audio, copy the video stream.
    fn build_copy_args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-an".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Builds encode arguments for the given encoder at the target bitrate.
    fn build_encode_args(
        &self,
        input: &Path,
        output: &Path,
        encoder: &str,
        bitrate_bps: u64,
        threads: Option<u32>,
    ) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            // Cap the long edge, keep aspect ratio, never upscale.
            "-vf".to_string(),
            format!("scale='min({},iw)':-2", self.config.max_long_edge),
            "-c:v".to_string(),
            encoder.to_string(),
            "-maxrate".to_string(),
            bitrate_bps.to_string(),
            "-bufsize".to_string(),
            (bitrate_bps * 2).to_string(),
            "-an".to_string(),
        ];

        if encoder == "libx264" {
            args.extend([
                "-crf".to_string(),
                "24".to_string(),
                "-preset".to_string(),
                "ultrafast".to_string(),
                "-tune".to_string(),
                "fastdecode".to_string(),
            ]);
        } else {
            args.extend([
                "-cq".to_string(),
                "24".to_string(),
                "-preset".to_string(),
                "p1".to_string(),
                "-tune".to_string(),
                "ll".to_string(),
            ]);
        }

        if let Some(threads) = threads {
            args.extend(["-threads".to_string(), threads.to_string()]);
        }

        args.extend([
            "-loglevel".to_string(),
            "error".to_string(),
            output.to_string_lossy().to_string(),
        ]);

        args
    }

    /// Parses ffprobe JSON output into MediaProbe.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaProbe, TranscodeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| TranscodeError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");
        let has_audio = probe.streams.iter().any(|s| s.codec_type == "audio");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaProbe {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            has_audio,
        })
    }

    /// Runs one ffmpeg invocation to completion, with timeout.
    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), TranscodeError> {
        let child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // Reap the encode on timeout instead of leaving it running.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                    return Err(TranscodeError::encode_failed(
                        format!("FFmpeg exited with code: {:?}", output.status.code()),
                        if stderr.is_empty() { None } else { Some(stderr) },
                    ));
                }
                Ok(())
            }
            Ok(Err(e)) => Err(TranscodeError::Io(e)),
            Err(_) => Err(TranscodeError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }),
        }
    }

    /// Verifies the output exists and returns its size.
    async fn output_size(&self, output: &Path) -> Result<u64, TranscodeError> {
        let meta = tokio::fs::metadata(output)
            .await
            .map_err(|_| TranscodeError::encode_failed("Output file not created", None))?;
        Ok(meta.len())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaProbe, TranscodeError> {
        if !path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscodeError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn shrink_to_fit(
        &self,
        input: &Path,
        output: &Path,
        target_bytes: u64,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let start = Instant::now();
        let info = self.probe(input).await?;

        // Fast path: already within budget, only strip audio.
        if info.size_bytes <= target_bytes {
            debug!(
                input = %input.display(),
                size = info.size_bytes,
                "Input fits budget, stripping audio only"
            );
            self.run_ffmpeg(&self.build_copy_args(input, output)).await?;
            return Ok(TranscodeOutcome {
                output_path: output.to_path_buf(),
                output_size_bytes: self.output_size(output).await?,
                strategy: TranscodeStrategy::StreamCopy,
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        if info.duration_secs <= 0.0 {
            return Err(TranscodeError::NoDuration {
                path: input.to_path_buf(),
            });
        }

        let bitrate_bps = ((target_bytes * 8) as f64 / info.duration_secs) as u64;
        debug!(
            input = %input.display(),
            bitrate_bps = bitrate_bps,
            "Encoding to size budget"
        );

        // Hardware first, software fallback.
        if let Some(encoder) = &self.config.hardware_encoder {
            let args = self.build_encode_args(input, output, encoder, bitrate_bps, None);
            match self.run_ffmpeg(&args).await {
                Ok(()) => {
                    return Ok(TranscodeOutcome {
                        output_path: output.to_path_buf(),
                        output_size_bytes: self.output_size(output).await?,
                        strategy: TranscodeStrategy::Hardware,
                        duration_ms: start.elapsed().as_millis() as u64,
                    });
                }
                Err(e) => {
                    warn!(encoder = encoder.as_str(), error = %e, "Hardware encode failed, falling back to software");
                    let _ = tokio::fs::remove_file(output).await;
                }
            }
        }

        let args = self.build_encode_args(
            input,
            output,
            "libx264",
            bitrate_bps,
            Some(self.config.software_threads),
        );
        self.run_ffmpeg(&args).await?;

        Ok(TranscodeOutcome {
            output_path: output.to_path_buf(),
            output_size_bytes: self.output_size(output).await?,
            strategy: TranscodeStrategy::Software,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        Ok(())
    }
}
