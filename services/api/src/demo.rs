//! CLI walkthroughs used for stakeholder demos and manual smoke checks.

use crate::infra::{default_settings, InMemoryApplicationRepository};
use civic_portal::error::AppError;
use civic_portal::workflows::housing::{
    compute_fee, score, EligibilityConfig, HouseholdProfile, HousingCondition, HousingProgramType,
};
use civic_portal::workflows::zoning::{
    Actor, ActorId, ActorRole, ApplicantProfile, ClientMeta, DocumentId, DocumentType,
    DocumentUpload, FileMetadata, RequestContext, ReviewAction, ReviewStage, ZoningSubmission,
    ZoningWorkflowService,
};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Declared gross monthly household income in pesos
    #[arg(long)]
    pub(crate) monthly_income: f64,
    /// Number of household members
    #[arg(long)]
    pub(crate) household_size: u8,
    /// Years the household has resided in the municipality
    #[arg(long)]
    pub(crate) years_of_residency: u8,
    /// Current housing condition
    #[arg(long, value_parser = parse_condition, default_value = "renting")]
    pub(crate) housing_condition: HousingCondition,
    #[arg(long)]
    pub(crate) displaced_by_project: bool,
    #[arg(long)]
    pub(crate) disaster_victim: bool,
    #[arg(long)]
    pub(crate) senior: bool,
    #[arg(long)]
    pub(crate) pwd: bool,
    #[arg(long)]
    pub(crate) solo_parent: bool,
    #[arg(long)]
    pub(crate) ofw: bool,
    /// Assistance program to quote fees for
    #[arg(long, value_parser = parse_program, default_value = "housing-unit")]
    pub(crate) program: HousingProgramType,
    /// Units requested under the program
    #[arg(long, default_value_t = 1)]
    pub(crate) units: u32,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Applicant name used for the walkthrough submission
    #[arg(long, default_value = "Maria Santos")]
    pub(crate) applicant: String,
    /// Stop after the zoning stage instead of running to approval
    #[arg(long)]
    pub(crate) zoning_only: bool,
}

fn parse_condition(raw: &str) -> Result<HousingCondition, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "informal_settlement" | "informal-settlement" => Ok(HousingCondition::InformalSettlement),
        "dilapidated" => Ok(HousingCondition::Dilapidated),
        "shared_dwelling" | "shared-dwelling" => Ok(HousingCondition::SharedDwelling),
        "renting" => Ok(HousingCondition::Renting),
        "owned" => Ok(HousingCondition::Owned),
        other => Err(format!("unknown housing condition '{other}'")),
    }
}

fn parse_program(raw: &str) -> Result<HousingProgramType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "lot_acquisition" | "lot-acquisition" => Ok(HousingProgramType::LotAcquisition),
        "housing_unit" | "housing-unit" => Ok(HousingProgramType::HousingUnit),
        "rental_subsidy" | "rental-subsidy" => Ok(HousingProgramType::RentalSubsidy),
        other => Err(format!("unknown program '{other}'")),
    }
}

/// Score a household against the configured eligibility weights and quote
/// the program fee, printing the per-factor breakdown.
pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let settings = default_settings();
    let config = EligibilityConfig::from_settings(&settings)?;

    let profile = HouseholdProfile {
        monthly_income: args.monthly_income,
        household_size: args.household_size,
        years_of_residency: args.years_of_residency,
        housing_condition: args.housing_condition,
        displaced_by_project: args.displaced_by_project,
        disaster_victim: args.disaster_victim,
        has_senior_member: args.senior,
        has_pwd_member: args.pwd,
        solo_parent: args.solo_parent,
        ofw_household: args.ofw,
    };

    let breakdown = score(&profile, &config);
    let fee = compute_fee(args.program, args.units, &config);

    println!("Housing assistance eligibility");
    println!("==============================");
    for component in &breakdown.components {
        println!(
            "  {:<20} raw {:>6.1}  weighted {:>6.2}  ({})",
            format!("{:?}", component.factor),
            component.raw,
            component.weighted,
            component.notes,
        );
    }
    println!("  weighted total        {:>6.2}", breakdown.weighted_total);
    println!("  bonus points          {:>6.2}", breakdown.bonus_points);
    println!("  final score           {:>6.2}", breakdown.total);
    println!();
    println!(
        "Fee quote for {} x{}: base {:.2} + processing {:.2} = {:.2}",
        args.program.label(),
        args.units,
        fee.base,
        fee.processing,
        fee.total,
    );
    Ok(())
}

/// Walk one zoning clearance application through the full review pipeline
/// on an in-memory stack, printing each transition and the audit trail.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = ZoningWorkflowService::new(Arc::new(InMemoryApplicationRepository::default()));

    let ctx = |id: &str, role: ActorRole| RequestContext {
        actor: Actor {
            id: ActorId(id.to_string()),
            role,
        },
        client: ClientMeta {
            ip: "127.0.0.1".to_string(),
            user_agent: "civic-portal-cli".to_string(),
        },
    };
    let applicant = ctx("demo-applicant", ActorRole::Applicant);
    let officer = ctx("demo-zoning-officer", ActorRole::ZoningOfficer);
    let engineer = ctx("demo-technical-reviewer", ActorRole::TechnicalReviewer);
    let admin = ctx("demo-administrator", ActorRole::Administrator);

    let file = |name: &str| FileMetadata {
        file_name: name.to_string(),
        storage_key: format!("store://demo/{name}"),
    };
    let submission = ZoningSubmission {
        applicant: ApplicantProfile {
            full_name: args.applicant.clone(),
            contact_number: "+63-917-555-0100".to_string(),
            email: "demo@example.ph".to_string(),
            barangay: "San Isidro".to_string(),
            project_description: "Two storey residential dwelling".to_string(),
            project_location: "Block 4 Lot 7, San Isidro".to_string(),
            land_area_sqm: 120.0,
        },
        documents: vec![
            DocumentUpload {
                document_type: DocumentType::ProofOfOwnership,
                file: file("title.pdf"),
            },
            DocumentUpload {
                document_type: DocumentType::SitePlan,
                file: file("site-plan.pdf"),
            },
            DocumentUpload {
                document_type: DocumentType::BuildingPlan,
                file: file("building-plan.pdf"),
            },
        ],
    };

    let record = service.submit(&applicant, submission)?;
    let id = record.application.id.clone();
    println!("submitted {} for {}", id.0, args.applicant);

    service.confirm_payment(&officer, &id)?;
    println!("payment confirmed");

    service
        .apply(&officer, &id, ReviewAction::StartInitialReview, None)?;
    service
        .assign_staff(&officer, &id, officer.actor.id.clone())?;
    for suffix in ["D1", "D2"] {
        service
            .verify_document(
                &officer,
                &id,
                &DocumentId(format!("{}-{suffix}", id.0)),
                None,
            )?;
    }
    let record = service
        .apply(&officer, &id, ReviewAction::ForwardToTechnical, None)?;
    println!("zoning stage complete, now {}", record.application.status.label());

    if !args.zoning_only {
        service
            .assign_technical_staff(&officer, &id, engineer.actor.id.clone())?;
        service
            .verify_document(
                &engineer,
                &id,
                &DocumentId(format!("{}-D3", id.0)),
                Some("complies with the building code".to_string()),
            )?;
        service
            .apply(&engineer, &id, ReviewAction::ReturnToZoning, None)?;
        let record = service
            .apply(&admin, &id, ReviewAction::Approve, None)?;
        println!("final decision: {}", record.application.status.label());
    }

    println!();
    println!("Document ledger");
    println!("===============");
    let record = service.get(&id)?;
    for stage in ReviewStage::ordered() {
        println!("  {} stage", stage.label());
        for document in record.documents.iter().filter(|d| d.stage == stage) {
            println!(
                "    {:<24} {}",
                document.document_type.label(),
                document.verification.label(),
            );
        }
    }

    println!();
    println!("Audit trail");
    println!("===========");
    let history = service.history(&id)?;
    for entry in history.entries() {
        let change = match (entry.old_status, entry.new_status) {
            (Some(old), Some(new)) => format!(" {} -> {}", old.label(), new.label()),
            _ => String::new(),
        };
        println!(
            "  {}  {:<24} by {}{}",
            entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            entry.action.label(),
            entry.actor.0,
            change,
        );
    }
    Ok(())
}
