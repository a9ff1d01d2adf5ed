use chrono::Local;
use std::env;
use std::process;
use zenith_poster::{EditorConfig, HtmlMode, PosterEditor, PosterError, PosterFile};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: poster-render [--export] [--config <config.yaml>] <poster.yaml>...");
        eprintln!();
        eprintln!("Renders each poster file to HTML on stdout.");
        eprintln!("  --export   leave out editing chrome (A4 capture layout)");
        process::exit(1);
    }

    let mut mode = HtmlMode::Editor;
    let mut config_path = None;
    let mut files = Vec::new();
    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--export" => mode = HtmlMode::Export,
            "--config" => match rest.next() {
                Some(path) => config_path = Some(path.clone()),
                None => {
                    eprintln!("--config needs a path");
                    process::exit(1);
                }
            },
            _ => files.push(arg.clone()),
        }
    }

    let config = match config_path {
        Some(path) => match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ {}: {}", path, e);
                process::exit(1);
            }
        },
        None => EditorConfig::default(),
    };

    let mut exit_code = 0;
    for file_path in files {
        match render_file(&file_path, &config, mode) {
            Ok(html) => println!("{}", html),
            Err(e) => {
                eprintln!("✗ {} has errors:", file_path);
                print_error(&e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

fn render_file(path: &str, config: &EditorConfig, mode: HtmlMode) -> Result<String, PosterError> {
    let file = PosterFile::load(path)?;
    let editor = PosterEditor::from_poster_file(config.clone(), &file)?;
    editor.html(mode, Local::now().date_naive())
}

fn print_error(error: &PosterError) {
    match error {
        PosterError::InvalidDate { value } => {
            eprintln!("  Invalid date '{}':", value);
            eprintln!("    expected YY.MM.DD or YY.MM.DD (Day)");
        }
        PosterError::CapacityExceeded { max } => {
            eprintln!("  Too many patterns:");
            eprintln!("    a poster holds at most {}", max);
        }
        PosterError::YamlError(msg) => {
            eprintln!("  YAML error:");
            eprintln!("    {}", msg);
        }
        other => {
            eprintln!("  {}", other);
        }
    }
}
