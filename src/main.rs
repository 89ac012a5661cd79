use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sightline::{Config, Daemon};

/// Sightline - Spoken scene description from a phone camera
#[derive(Parser)]
#[command(name = "sightline", version, about)]
struct Cli {
    /// Port to listen on (overrides SIGHTLINE_PORT / PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Camera stream URL to use at startup
    #[arg(long)]
    camera_url: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for headless servers without audio hardware)
    #[arg(long, env = "SIGHTLINE_DISABLE_VOICE")]
    disable_voice: bool,

    /// Start listening for voice commands as soon as the server is up
    #[arg(long)]
    assistant: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Grab one frame, detect objects, and print the report
    Detect {
        /// Full stream URL
        #[arg(long, conflicts_with = "ip")]
        url: Option<String>,
        /// Phone IP; the configured port and path are filled in
        #[arg(long)]
        ip: Option<String>,
    },
    /// Download the detection model if it is missing
    FetchModel,
    /// Test microphone input
    #[cfg(feature = "audio")]
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    #[cfg(feature = "audio")]
    TestSpeaker,
    /// Test TTS output
    #[cfg(feature = "audio")]
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,sightline=info",
        1 => "info,sightline=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_with_options(cli.disable_voice)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(url) = cli.camera_url {
        config.camera.initial_url = Some(url);
    }
    tracing::debug!(?config, "loaded configuration");

    // Handle subcommands
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Detect { url, ip } => detect(&config, url, ip).await,
            Command::FetchModel => fetch_model(&config).await,
            #[cfg(feature = "audio")]
            Command::TestMic { duration } => audio::test_mic(duration).await,
            #[cfg(feature = "audio")]
            Command::TestSpeaker => audio::test_speaker().await,
            #[cfg(feature = "audio")]
            Command::TestTts { text } => audio::test_tts(&config, &text).await,
        };
    }

    tracing::info!(
        port = config.server.port,
        voice = config.voice.enabled,
        "starting sightline"
    );

    Daemon::new(config).with_assistant(cli.assistant).run().await?;

    Ok(())
}

/// Run the perception pipeline once from the command line
async fn detect(config: &Config, url: Option<String>, ip: Option<String>) -> anyhow::Result<()> {
    Daemon::provision_model(config).await?;
    let model = Daemon::load_model(config).await?;
    let service = Daemon::perception_service(config, model)?;

    match (url, ip) {
        (Some(url), _) => {
            service.endpoints().set(&url)?;
        }
        (None, Some(ip)) => {
            service.endpoints().set_from_ip(&ip)?;
        }
        (None, None) => {}
    }

    let report = service.perceive().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("\n{}", report.spoken_summary());

    Ok(())
}

async fn fetch_model(config: &Config) -> anyhow::Result<()> {
    let path = Daemon::provision_model(config).await?;
    println!("Model ready at {}", path.display());
    Ok(())
}

#[cfg(feature = "audio")]
mod audio {
    use std::time::Duration;

    use sightline::Config;
    use sightline::assistant::Synthesizer;
    use sightline::voice::{AudioCapture, AudioPlayback, TextToSpeech};

    /// Test microphone input
    pub async fn test_mic(duration: u64) -> anyhow::Result<()> {
        println!("Testing microphone for {duration} seconds...");
        println!("Speak into your microphone!\n");

        let mut capture = AudioCapture::new()?;
        capture.start()?;

        println!("Sample rate: {} Hz", sightline::voice::SAMPLE_RATE);
        println!("---");

        for i in 0..duration {
            tokio::time::sleep(Duration::from_secs(1)).await;

            let samples = capture.take_buffer();
            let energy = calculate_rms(&samples);
            let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

            // Visual meter
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let meter_len = (energy * 100.0).min(50.0) as usize;
            let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

            println!(
                "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
                i + 1,
                energy,
                peak,
                meter
            );
        }

        capture.stop();

        println!("\n---");
        println!("If you saw movement in the meter, your mic is working!");
        println!("If RMS stayed near 0, check:");
        println!("  1. Is your mic plugged in?");
        println!("  2. Run: pactl info | grep 'Default Source'");
        println!("  3. Run: arecord -l (to list devices)");

        Ok(())
    }

    /// Calculate RMS energy
    #[allow(clippy::cast_precision_loss)]
    fn calculate_rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
        (sum_squares / samples.len() as f32).sqrt()
    }

    /// Test speaker output with a sine wave
    pub async fn test_speaker() -> anyhow::Result<()> {
        println!("Testing speaker output...");
        println!("You should hear a 440Hz tone for 2 seconds\n");

        // 2 seconds of 440Hz at the 24kHz playback rate
        let sample_rate = 24000_u32;
        let frequency = 440.0_f32;
        let num_samples = sample_rate as usize * 2;

        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<f32> = (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
            })
            .collect();

        println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

        tokio::task::spawn_blocking(move || {
            let playback = AudioPlayback::new()?;
            playback.play_samples(samples)
        })
        .await??;

        println!("\n---");
        println!("If you heard the tone, your speakers are working!");
        println!("If you didn't hear anything, check:");
        println!("  1. Run: pactl info | grep 'Default Sink'");
        println!("  2. Run: pactl list sinks short");

        Ok(())
    }

    /// Test TTS output through the configured provider
    pub async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
        println!("Testing TTS with text: \"{text}\"\n");

        let tts = TextToSpeech::from_config(&config.api_keys, &config.voice)?;

        println!("Synthesizing speech...");
        let mp3_data = tts.synthesize(text).await?;
        println!("Received {} bytes of audio", mp3_data.len());

        tokio::task::spawn_blocking(move || {
            let playback = AudioPlayback::new()?;
            playback.play_mp3(&mp3_data)
        })
        .await??;

        println!("\nDone!");
        Ok(())
    }
}
