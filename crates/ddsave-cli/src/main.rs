use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use ddsave_core::{PlayerType, Preset, PresetManager, ReplacementType, Sav, SavError, WriteOpts};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "ddsave-cli",
    about = "Inspect and edit Dragon's Dogma saves, and move character presets between them",
    version
)]
struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print header fields, names and Steam id
    Info(InfoArgs),
    /// Dump the save document as JSON
    Dump(DumpArgs),
    /// Write the save document as a standalone XML file
    ExportXml(ExportArgs),
    /// Set the Arisen's name
    SetName(NameArgs),
    /// Set the pawn's name
    SetPawnName(NameArgs),
    /// Set the Steam id
    SetSteamId(SteamIdArgs),
    /// Extract appearance and stats of the Arisen or pawn into a preset file
    ExtractPreset(ExtractArgs),
    /// Apply a preset file onto the Arisen or pawn
    ApplyPreset(ApplyArgs),
    /// Zip a save file or save directory next to itself
    Backup(BackupArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Who {
    Arisen,
    Pawn,
}

impl From<Who> for PlayerType {
    fn from(w: Who) -> Self {
        match w {
            Who::Arisen => PlayerType::Arisen,
            Who::Pawn => PlayerType::Pawn,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    All,
    Appearance,
    Stats,
}

impl From<Mode> for ReplacementType {
    fn from(m: Mode) -> Self {
        match m {
            Mode::All => ReplacementType::All,
            Mode::Appearance => ReplacementType::AppearanceOnly,
            Mode::Stats => ReplacementType::StatsOnly,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct InfoArgs {
    /// Save file (.sav)
    path: PathBuf,
    /// Print as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct DumpArgs {
    /// Save file (.sav)
    path: PathBuf,
    /// Max child elements to include per element
    #[arg(long, default_value_t = 128)]
    max_children: usize,
    /// Max recursion depth
    #[arg(long, default_value_t = 16)]
    max_depth: usize,
}

#[derive(ClapArgs, Debug)]
struct ExportArgs {
    /// Save file (.sav)
    path: PathBuf,
    /// Output .xml path
    #[arg(long, value_name = "XML")]
    out: PathBuf,
    /// Write without indentation
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(ClapArgs, Debug)]
struct NameArgs {
    /// Save file (.sav)
    path: PathBuf,
    /// New name, at most 25 characters
    name: String,
    #[command(flatten)]
    write: WriteTarget,
}

#[derive(ClapArgs, Debug)]
struct SteamIdArgs {
    /// Save file (.sav)
    path: PathBuf,
    steam_id: u64,
    #[command(flatten)]
    write: WriteTarget,
}

#[derive(ClapArgs, Debug)]
struct ExtractArgs {
    /// Save file (.sav)
    path: PathBuf,
    #[arg(long, value_enum, default_value_t = Who::Arisen)]
    from: Who,
    /// Output preset .xml path
    #[arg(long, value_name = "XML")]
    out: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ApplyArgs {
    /// Save file (.sav)
    path: PathBuf,
    /// Preset .xml file
    #[arg(long, value_name = "XML")]
    preset: PathBuf,
    #[arg(long, value_enum, default_value_t = Who::Arisen)]
    to: Who,
    #[arg(long, value_enum, default_value_t = Mode::All)]
    mode: Mode,
    #[command(flatten)]
    write: WriteTarget,
}

#[derive(ClapArgs, Debug)]
struct BackupArgs {
    /// Save file or directory
    path: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct WriteTarget {
    /// Output .sav path; defaults to overwriting the input
    #[arg(long, value_name = "SAV")]
    out: Option<PathBuf>,
    /// Skip the zip backup taken before overwriting the input
    #[arg(long, default_value_t = false)]
    no_backup: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.cmd {
        Cmd::Info(a) => cmd_info(a),
        Cmd::Dump(a) => cmd_dump(a),
        Cmd::ExportXml(a) => cmd_export(a),
        Cmd::SetName(a) => cmd_set_name(a, PlayerType::Arisen),
        Cmd::SetPawnName(a) => cmd_set_name(a, PlayerType::Pawn),
        Cmd::SetSteamId(a) => cmd_set_steam_id(a),
        Cmd::ExtractPreset(a) => cmd_extract(a),
        Cmd::ApplyPreset(a) => cmd_apply(a),
        Cmd::Backup(a) => cmd_backup(a),
    }
}

fn fail(e: SavError) -> ! {
    eprintln!("error: {}", e);
    std::process::exit(if e.is_data_error() { 3 } else { 2 });
}

fn load(path: &Path) -> Sav {
    Sav::load(path).unwrap_or_else(|e| fail(e))
}

fn write_back(sav: &mut Sav, input: &Path, target: &WriteTarget) {
    let out = target.out.as_deref().unwrap_or(input);
    if out == input && !target.no_backup {
        ddsave_core::backup::zip_backup(input).unwrap_or_else(|e| fail(e));
    }
    sav.save(out).unwrap_or_else(|e| fail(e));
}

fn cmd_info(args: InfoArgs) {
    let sav = load(&args.path);
    if args.json {
        let v = ddsave_core::json::summary_json(&sav);
        println!("{}", serde_json::to_string_pretty(&v).unwrap_or_default());
        return;
    }
    println!("header:     {}", ddsave_core::sav::to_hex_string(sav.header()));
    println!("version:    {}{}", sav.version, if sav.is_pc_layout() { "" } else { " (console layout)" });
    println!("checksum:   {:#010x} ({})", sav.checksum, if sav.checksum_matches() { "ok" } else { "mismatch" });
    println!("player:     {}", sav.player_name().unwrap_or_default());
    println!("pawn:       {}", sav.pawn_name().unwrap_or_default());
    match sav.steam_id() {
        Some(id) => println!("steam id:   {}", id),
        None => println!("steam id:   <none>"),
    }
}

fn cmd_dump(args: DumpArgs) {
    let sav = load(&args.path);
    let opts = ddsave_core::json::JsonOpts {
        max_children: args.max_children,
        max_depth: args.max_depth,
    };
    print!("{}", ddsave_core::json::dump_document_json(sav.document(), opts));
}

fn cmd_export(args: ExportArgs) {
    let sav = load(&args.path);
    let opts = WriteOpts { indent: !args.compact };
    sav.export_xml(&args.out, opts).unwrap_or_else(|e| fail(e));
}

fn cmd_set_name(args: NameArgs, who: PlayerType) {
    let mut sav = load(&args.path);
    match sav.document_mut().set_name(who, &args.name) {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("no {:?} name node in save", who);
            std::process::exit(4);
        }
        Err(e) => fail(e),
    }
    write_back(&mut sav, &args.path, &args.write);
}

fn cmd_set_steam_id(args: SteamIdArgs) {
    let mut sav = load(&args.path);
    if !sav.set_steam_id(args.steam_id) {
        eprintln!("no Steam id node in save");
        std::process::exit(4);
    }
    write_back(&mut sav, &args.path, &args.write);
}

fn cmd_extract(args: ExtractArgs) {
    let sav = load(&args.path);
    let preset = Preset::try_from_sav(&sav, args.from.into()).unwrap_or_else(|e| fail(e));
    preset.save(&args.out).unwrap_or_else(|e| fail(e));
}

fn cmd_apply(args: ApplyArgs) {
    let mut mgr = PresetManager::new();
    mgr.load_sav(&args.path).unwrap_or_else(|e| fail(e));
    mgr.load_preset(&args.preset).unwrap_or_else(|e| fail(e));
    if !mgr.apply_preset(args.to.into(), args.mode.into()) {
        eprintln!("preset could not be applied");
        std::process::exit(4);
    }
    let Some(mut sav) = mgr.take_sav() else {
        std::process::exit(4);
    };
    write_back(&mut sav, &args.path, &args.write);
}

fn cmd_backup(args: BackupArgs) {
    let dest = ddsave_core::backup::zip_backup(&args.path).unwrap_or_else(|e| fail(e));
    println!("{}", dest.display());
}
