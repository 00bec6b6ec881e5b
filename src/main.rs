//! Dubber - AI voice-over for videos

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::Parser;
use dubber::media::Ffmpeg;
use dubber::pipeline::DubbingPipeline;
use dubber::{init_logging, Args, Command, Config, Language, SourceVideo};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    if args.verbose {
        println!("{}", dubber::get_library_info());
        println!();
    }

    let load_config = || Config::from_args_and_config(&args);

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => {
            dubber::server::serve(&load_config()?).await?;
        }
        Command::Run { input, language, output } => {
            let language: Language = language.parse()?;
            run_single(&load_config()?, input, language, &output).await?;
        }
        Command::Check => run_check(&load_config()?).await?,
        Command::InitConfig { path } => {
            Config::create_default_config(&path)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("Default configuration written to {}", path.display());
        }
    }

    Ok(())
}

async fn run_single(config: &Config, input: PathBuf, language: Language, output: &Path) -> anyhow::Result<()> {
    if !input.is_file() {
        bail!("Input file does not exist: {}", input.display());
    }

    println!("=== AI Voice-Over ===");
    println!("Input: {}", input.display());
    println!("Language: {}", language);
    println!("Output: {}", output.display());
    println!("=====================\n");

    let pipeline = DubbingPipeline::from_config(config)?;
    let result = pipeline.run(SourceVideo::File(input), language).await;
    let dubbed = match result {
        Ok(dubbed) => dubbed,
        Err(e) => bail!("{}", e.user_message()),
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    if std::fs::rename(&dubbed.video, output).is_err() {
        std::fs::copy(&dubbed.video, output)
            .with_context(|| format!("cannot write {}", output.display()))?;
        std::fs::remove_file(&dubbed.video).ok();
    }

    println!("Transcript: {}", dubbed.transcript);
    println!("\n=== Processing Complete ===");
    println!("Saved: {}", output.display());
    Ok(())
}

async fn run_check(config: &Config) -> anyhow::Result<()> {
    println!("=== Environment Check ===");
    let mut ok = true;

    println!("✅ Config OK");

    let ffmpeg = Ffmpeg::new(config.ffmpeg.binary.clone());
    if ffmpeg.is_available().await {
        println!("✅ ffmpeg: {}", ffmpeg.binary().display());
    } else {
        println!("❌ ffmpeg not runnable: {}", ffmpeg.binary().display());
        ok = false;
    }

    if config.model_path().is_file() {
        println!("✅ Model: {}", config.model_path().display());
    } else {
        println!("❌ Model file not found: {}", config.model_path().display());
        ok = false;
    }

    if cfg!(feature = "whisper-runtime") {
        println!("✅ Speech recognition runtime compiled in ({} threads)", config.whisper.threads);
    } else {
        println!("❌ Speech recognition runtime not compiled in (build with --features whisper-runtime)");
        ok = false;
    }

    println!("✅ TTS endpoint: {}", config.tts.base_url);

    if !ok {
        bail!("environment check failed");
    }
    println!("✅ Ready for processing");
    Ok(())
}
