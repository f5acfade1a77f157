//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use modsync_ops::{InstallPlan, OperationResult};
use modsync_types::{
    ColorChoice, HandlerReport, InstallReport, PackageOutcome, PackageRow, ResetReport,
};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            Self::render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::PackageList(packages) => self.render_package_list(packages),
            OperationResult::Selection(names) => self.render_selection(names),
            OperationResult::Plan(plan) => self.render_plan(plan),
            OperationResult::InstallReport(report) => self.render_install_report(report),
            OperationResult::Reset(report) => self.render_reset(report),
            OperationResult::Success(message) => {
                println!("{message}");
                Ok(())
            }
        }
    }

    /// Render package list
    fn render_package_list(&self, packages: &[PackageRow]) -> io::Result<()> {
        if packages.is_empty() {
            println!("No packages match.");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Selected").add_attribute(Attribute::Bold),
            Cell::new("Dependencies").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
        ]);

        for package in packages {
            let name = if package.display_name == package.name {
                package.name.clone()
            } else {
                format!("{} ({})", package.display_name, package.name)
            };
            let dependencies = if package.dependencies.is_empty() {
                "-".to_string()
            } else {
                package.dependencies.join(", ")
            };

            table.add_row(vec![
                Cell::new(name),
                self.selection_cell(package),
                Cell::new(dependencies),
                Cell::new(package.description.as_deref().unwrap_or("-")),
            ]);
        }

        println!("{table}");
        Ok(())
    }

    fn render_selection(&self, names: &[String]) -> io::Result<()> {
        println!("{}", self.style_heading("Selected packages"));
        for name in names {
            println!("  • {name}");
        }
        Ok(())
    }

    fn render_plan(&self, plan: &InstallPlan) -> io::Result<()> {
        println!("{}", self.style_heading("Dry run"));
        println!();
        if plan.install_complete {
            println!("Installation already completed; a reconfigure would apply:");
        } else {
            println!("First-time installation would apply:");
        }

        if plan.to_remove.is_empty() && plan.to_install.is_empty() {
            println!("  No changes.");
            return Ok(());
        }
        for name in &plan.to_remove {
            println!("  - {name}");
        }
        for name in &plan.to_install {
            println!("  + {name}");
        }
        Ok(())
    }

    /// Render installation report
    fn render_install_report(&self, report: &InstallReport) -> io::Result<()> {
        println!("{}", self.style_heading("Installation Summary"));
        println!();

        if !report.removed.is_empty() {
            println!("Removed ({}):", report.removed.len());
            for name in &report.removed {
                println!("  - {name}");
            }
            println!();
        }

        if report.packages.is_empty() {
            println!("No packages to install.");
        } else {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                Cell::new("Package").add_attribute(Attribute::Bold),
                Cell::new("Outcome").add_attribute(Attribute::Bold),
            ]);
            for package in &report.packages {
                table.add_row(vec![
                    Cell::new(&package.name),
                    self.outcome_cell(&package.outcome),
                ]);
            }
            println!("{table}");
        }

        if !report.handlers.is_empty() {
            println!();
            Self::render_handlers(&report.handlers);
        }

        println!();
        println!("State: {}", report.state);
        println!("Duration: {}ms", report.duration_ms);
        Ok(())
    }

    /// Render what a reset removed
    fn render_reset(&self, report: &ResetReport) -> io::Result<()> {
        println!("{}", self.style_heading("Reset Summary"));
        println!();
        if report.removed.is_empty() {
            println!("No checkouts removed.");
        } else {
            println!("Removed ({}):", report.removed.len());
            for name in &report.removed {
                println!("  - {name}");
            }
        }
        if !report.handlers.is_empty() {
            println!();
            Self::render_handlers(&report.handlers);
        }
        println!();
        println!("Stored selection and installation state cleared.");
        Ok(())
    }

    fn render_handlers(handlers: &[HandlerReport]) {
        println!("Handlers:");
        for handler in handlers {
            match &handler.message {
                Some(message) if !handler.success => {
                    println!("  [ERROR] {}: {message}", handler.name);
                }
                _ => println!("  [OK] {}", handler.name),
            }
        }
    }

    fn selection_cell(&self, package: &PackageRow) -> Cell {
        let text = match (package.selected, package.required) {
            (true, true) => "required",
            (true, false) => "yes",
            (false, _) => "no",
        };
        let cell = Cell::new(text);
        if !self.supports_color() {
            return cell;
        }
        match (package.selected, package.required) {
            (true, true) => cell.fg(Color::Cyan),
            (true, false) => cell.fg(Color::Green),
            (false, _) => cell,
        }
    }

    fn outcome_cell(&self, outcome: &PackageOutcome) -> Cell {
        let cell = Cell::new(outcome.to_string());
        if !self.supports_color() {
            return cell;
        }
        match outcome {
            PackageOutcome::Completed => cell.fg(Color::Green),
            PackageOutcome::Skipped | PackageOutcome::Cancelled => cell.fg(Color::Blue),
            PackageOutcome::NotFound | PackageOutcome::TimedOut { .. } => cell.fg(Color::Yellow),
            PackageOutcome::Failed { .. } => cell.fg(Color::Red),
        }
    }

    fn style_heading(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}
