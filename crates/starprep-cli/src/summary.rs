use chrono::Local;
use console::Style;
use starprep_core::config::{ProcessDepth, RunConfiguration};
use starprep_core::consts::TIMESTAMP_FORMAT;
use starprep_core::frames::FrameClass;
use starprep_core::pipeline::RunReport;
use starprep_core::profile::CameraProfile;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    error: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            error: Style::new().red().bold(),
        }
    }
}

const RULE: &str = "\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}";

/// Banner printed before the first stage: directories and active options.
pub fn print_run_summary(config: &RunConfiguration, engine_name: &str) {
    let s = Styles::new();
    let root = &config.working_dir;

    println!();
    println!(
        "  {}",
        s.title.apply_to(format!(
            "Processing started at {}",
            Local::now().format(TIMESTAMP_FORMAT)
        ))
    );
    println!("  {}", s.title.apply_to(RULE));
    println!();

    println!("  {}", s.header.apply_to("Directories"));
    let dir_row = |label: &str, dir: String| {
        println!("    {:<14}{}", s.label.apply_to(label), s.path.apply_to(dir));
    };
    dir_row("Working", root.display().to_string());
    dir_row(
        "Light",
        FrameClass::Light
            .source_dir(root, &config.target)
            .display()
            .to_string(),
    );
    dir_row("Flat", FrameClass::Flat.source_dir(root, "").display().to_string());
    dir_row(
        "Offset",
        FrameClass::Offset.source_dir(root, "").display().to_string(),
    );
    if config.camera == CameraProfile::Dslr {
        dir_row("Dark", FrameClass::Dark.source_dir(root, "").display().to_string());
    }
    dir_row("Process", config.process_dir().display().to_string());
    println!();

    println!("  {}", s.header.apply_to("Masters"));
    match config.master_bias {
        Some(ref bias) => dir_row("Bias", bias.display().to_string()),
        None => println!(
            "    {:<14}{}",
            s.label.apply_to("Bias"),
            s.disabled.apply_to("built from offset frames")
        ),
    }
    match config.master_dark {
        Some(ref dark) => dir_row("Dark", dark.display().to_string()),
        None if config.capabilities().builds_dark_master => println!(
            "    {:<14}{}",
            s.label.apply_to("Dark"),
            s.disabled.apply_to("built from dark frames")
        ),
        None => println!(
            "    {:<14}{}",
            s.label.apply_to("Dark"),
            s.disabled.apply_to("none")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Options"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Camera"),
        s.method.apply_to(config.camera)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Engine"),
        s.method.apply_to(engine_name)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Index start"),
        s.value.apply_to(config.sequence_start)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("CPUs"),
        s.value.apply_to(config.workers)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Process"),
        s.method.apply_to(config.depth)
    );
    if config.depth.includes(ProcessDepth::Register) {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Reference"),
            s.value.apply_to(config.reference)
        );
    }
    println!();

    if config.depth == ProcessDepth::Stack {
        println!("  {}", s.header.apply_to("Filters"));
        println!(
            "    {:<14}{}",
            s.label.apply_to("FWHM"),
            s.value.apply_to(config.filters.fwhm)
        );
        println!(
            "    {:<14}{}",
            s.label.apply_to("wFWHM"),
            s.value.apply_to(config.filters.wfwhm)
        );
        println!(
            "    {:<14}{}",
            s.label.apply_to("Roundness"),
            s.value.apply_to(config.filters.roundness)
        );
        println!();
    }
}

/// Closing block: the stacked file on success, the error on failure.
/// `planned` marks a dry run, where the stacked file is only the name the
/// script will write.
pub fn print_run_outcome(report: &RunReport, planned: bool) {
    let s = Styles::new();
    let finished = report.finished.format(TIMESTAMP_FORMAT);
    let elapsed = report.finished - report.started;

    println!();
    match report.failure {
        None => {
            println!(
                "  {}",
                s.title
                    .apply_to(format!("Processing completed at {finished}"))
            );
            println!("  {}", s.title.apply_to(RULE));
            println!(
                "    {:<14}{}",
                s.label.apply_to("Stages"),
                s.value.apply_to(report.stages.len())
            );
            println!(
                "    {:<14}{}",
                s.label.apply_to("Elapsed"),
                s.value.apply_to(format!("{}s", elapsed.num_seconds()))
            );
            if let Some(ref stacked) = report.stacked_output {
                println!(
                    "    {:<14}{}",
                    s.label.apply_to(stacked_label(planned)),
                    s.path.apply_to(stacked.display())
                );
            }
        }
        Some(ref err) => {
            println!("  {}", s.error.apply_to(RULE));
            println!("  {} {}", s.error.apply_to("*** ERROR ***"), err);
            if let Some(failed) = report.failed_stage() {
                println!(
                    "    {:<14}{}",
                    s.label.apply_to("Stage"),
                    s.value.apply_to(failed.stage)
                );
                println!(
                    "    {:<14}{}",
                    s.label.apply_to("Frames"),
                    s.value.apply_to(failed.frames)
                );
            } else if let Some(stage) = err.stage() {
                println!(
                    "    {:<14}{}",
                    s.label.apply_to("Stage"),
                    s.value.apply_to(stage)
                );
            }
            println!(
                "    {:<14}{}",
                s.label.apply_to("Stopped at"),
                s.value.apply_to(finished)
            );
            println!("  {}", s.error.apply_to(RULE));
        }
    }
    println!();
}

/// A dry run writes no image, only the name its script will stack to.
fn stacked_label(planned: bool) -> &'static str {
    if planned {
        "Planned stack"
    } else {
        "Stacked"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_labels_stack_as_planned() {
        assert_eq!(stacked_label(true), "Planned stack");
        assert_eq!(stacked_label(false), "Stacked");
    }
}
