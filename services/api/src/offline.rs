use crate::infra::{in_memory_service, parse_cutoff, parse_order};
use clap::Args;
use hostel_allot::config::AppConfig;
use hostel_allot::error::AppError;
use hostel_allot::telemetry;
use hostel_allot::workflows::allotment::{
    AllotmentEvent, AllotmentPolicy, AllotmentRunResult, EligibilityOrder, RoomRegistration,
    RosterView, RunState, StudentRegistration,
};
use hostel_allot::workflows::roster::{RosterImporter, SeedSummary};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AllotArgs {
    /// Student roster CSV (registration_id,name,category,merit_score)
    #[arg(long)]
    pub(crate) students: PathBuf,
    /// Room CSV (building,block,room_number,total_capacity)
    #[arg(long)]
    pub(crate) rooms: PathBuf,
    /// Students per category eligible in this run (defaults to APP_CATEGORY_CUTOFF)
    #[arg(long, value_parser = parse_cutoff)]
    pub(crate) cutoff: Option<usize>,
    /// Processing order: category-major or rank-major
    #[arg(long, value_parser = parse_order)]
    pub(crate) order: Option<EligibilityOrder>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct OfflineReport {
    pub(crate) state: RunState,
    pub(crate) category_cutoff: usize,
    pub(crate) order: EligibilityOrder,
    pub(crate) students_imported: usize,
    pub(crate) rooms_imported: usize,
    pub(crate) eligible: usize,
    pub(crate) allotted: usize,
    pub(crate) unallotted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) warning: Option<String>,
    pub(crate) events: Vec<AllotmentEvent>,
    pub(crate) roster: RosterView,
}

pub(crate) fn run_offline_allotment(args: AllotArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_for_cli(&config.telemetry)?;

    let policy = AllotmentPolicy {
        category_cutoff: args.cutoff.unwrap_or(config.allotment.category_cutoff),
        order: args.order.unwrap_or(config.allotment.order),
    };

    let students = RosterImporter::students_from_path(&args.students)?;
    let rooms = RosterImporter::rooms_from_path(&args.rooms)?;
    let report = allot_roster(policy, students, rooms)?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        render_report(&report);
    }
    Ok(())
}

pub(crate) fn allot_roster(
    policy: AllotmentPolicy,
    students: Vec<StudentRegistration>,
    rooms: Vec<RoomRegistration>,
) -> Result<OfflineReport, AppError> {
    let (service, _repository) = in_memory_service(policy);
    let SeedSummary {
        students: students_imported,
        rooms: rooms_imported,
    } = RosterImporter::seed(&service, students, rooms)?;

    let result = service.run_default()?;
    let roster = service.roster()?;
    Ok(build_report(
        policy,
        students_imported,
        rooms_imported,
        result,
        roster,
    ))
}

fn build_report(
    policy: AllotmentPolicy,
    students_imported: usize,
    rooms_imported: usize,
    result: AllotmentRunResult,
    roster: RosterView,
) -> OfflineReport {
    OfflineReport {
        state: result.state,
        category_cutoff: result.category_cutoff,
        order: policy.order,
        students_imported,
        rooms_imported,
        eligible: result.eligible,
        allotted: result.new_allotments.len(),
        unallotted: result.unallotted(),
        warning: result.warning().map(|warning| warning.to_string()),
        events: result.events,
        roster,
    }
}

fn render_report(report: &OfflineReport) {
    println!("Hostel allotment run");
    println!(
        "- {} students / {} rooms imported | cutoff {} per category | {} order",
        report.students_imported, report.rooms_imported, report.category_cutoff, report.order
    );
    println!(
        "- {} eligible | {} allotted | {} left waiting",
        report.eligible, report.allotted, report.unallotted
    );

    if !report.events.is_empty() {
        println!("\nEvents");
        for event in &report.events {
            println!("  - {}", event.message());
        }
    }

    if let Some(warning) = &report.warning {
        println!("\nWarning: {warning}");
    }

    println!("\nRoster");
    for entry in &report.roster.students {
        let status = entry
            .room_number
            .as_deref()
            .map(|room| format!("Room {room}"))
            .unwrap_or_else(|| "not allotted".to_string());
        println!(
            "  - {} {} [{} {}] -> {}",
            entry.registration_id, entry.name, entry.category, entry.merit_score, status
        );
    }

    if report.roster.rooms_with_space.is_empty() {
        println!("\nNo rooms with space remain.");
    } else {
        println!("\nRooms with space");
        for room in &report.roster.rooms_with_space {
            println!(
                "  - {} / {} / Room {} ({}/{} filled)",
                room.building, room.block, room.room_number, room.occupancy, room.total_capacity
            );
        }
    }
}
