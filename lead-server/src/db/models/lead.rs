//! Lead Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use surrealdb::RecordId;

/// Lead ID type
pub type LeadId = RecordId;

/// Pipeline stage. Wire format keeps the legacy dashboard strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    #[serde(rename = "New Lead")]
    NewLead,
    #[serde(rename = "Survey Booked")]
    SurveyBooked,
    #[serde(rename = "Survey Complete")]
    SurveyComplete,
    #[serde(rename = "Install Complete")]
    InstallComplete,
    #[serde(rename = "Fall Off")]
    FallOff,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::NewLead => "New Lead",
            LeadStatus::SurveyBooked => "Survey Booked",
            LeadStatus::SurveyComplete => "Survey Complete",
            LeadStatus::InstallComplete => "Install Complete",
            LeadStatus::FallOff => "Fall Off",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New Lead" => Ok(LeadStatus::NewLead),
            "Survey Booked" => Ok(LeadStatus::SurveyBooked),
            "Survey Complete" => Ok(LeadStatus::SurveyComplete),
            "Install Complete" => Ok(LeadStatus::InstallComplete),
            "Fall Off" => Ok(LeadStatus::FallOff),
            _ => Err(format!("unknown lead status: {}", s)),
        }
    }
}

/// Survey outcome. Only meaningful once `survey_booked_date` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyStatus {
    Pending,
    #[serde(rename = "Good Survey")]
    Good,
    #[serde(rename = "Bad Survey")]
    Bad,
    #[serde(rename = "Sold Survey")]
    Sold,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::Pending => "Pending",
            SurveyStatus::Good => "Good Survey",
            SurveyStatus::Bad => "Bad Survey",
            SurveyStatus::Sold => "Sold Survey",
        }
    }
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SurveyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(SurveyStatus::Pending),
            "Good Survey" => Ok(SurveyStatus::Good),
            "Bad Survey" => Ok(SurveyStatus::Bad),
            "Sold Survey" => Ok(SurveyStatus::Sold),
            _ => Err(format!("unknown survey status: {}", s)),
        }
    }
}

/// Acquisition channel, used for the cost-per-lead split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadSource {
    Online,
    Field,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Online => "Online",
            LeadSource::Field => "Field",
        }
    }
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(LeadSource::Online),
            "Field" => Ok(LeadSource::Field),
            _ => Err(format!("unknown lead source: {}", s)),
        }
    }
}

/// Lead model matching SurrealDB schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<LeadId>,

    // Customer identity
    pub customer_name: String,
    pub customer_tel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_tel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub first_line_of_address: String,
    pub postcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_electricity_costs: Option<f64>,

    // Pipeline
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_status: Option<SurveyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_booked_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_complete_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_booked_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_assigned_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_paid_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fall_off_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fall_off_reason: Option<String>,

    // Attribution (free-text names, matched case-sensitively against identities)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_rep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<LeadSource>,

    // Financial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_amount: Option<f64>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub commission_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_model: Option<String>,

    // Notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_notes: Option<String>,

    /// Creation timestamp (Unix millis), set once at insert
    #[serde(default)]
    pub created_at: i64,
}

/// Create lead payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadCreate {
    pub customer_name: String,
    pub customer_tel: String,
    pub alternative_tel: Option<String>,
    pub customer_email: Option<String>,
    pub first_line_of_address: String,
    pub postcode: String,
    pub property_type: Option<String>,
    pub monthly_electricity_costs: Option<f64>,
    pub status: Option<LeadStatus>,
    pub account_manager: Option<String>,
    pub field_rep: Option<String>,
    pub installer: Option<String>,
    pub lead_source: Option<LeadSource>,
    pub lead_cost: Option<f64>,
    pub lead_revenue: Option<f64>,
    pub commission_amount: Option<f64>,
    pub payment_model: Option<String>,
    pub notes: Option<String>,
}

impl LeadCreate {
    /// Build the stored record. Pipeline dates start empty, status defaults to New Lead.
    pub fn into_lead(self, created_at: i64) -> Lead {
        Lead {
            id: None,
            customer_name: self.customer_name,
            customer_tel: self.customer_tel,
            alternative_tel: self.alternative_tel,
            customer_email: self.customer_email,
            first_line_of_address: self.first_line_of_address,
            postcode: self.postcode,
            property_type: self.property_type,
            monthly_electricity_costs: self.monthly_electricity_costs,
            status: self.status.unwrap_or_default(),
            account_manager: self.account_manager,
            field_rep: self.field_rep,
            installer: self.installer,
            lead_source: self.lead_source,
            lead_cost: self.lead_cost,
            lead_revenue: self.lead_revenue,
            commission_amount: self.commission_amount,
            payment_model: self.payment_model,
            notes: self.notes,
            created_at,
            ..Lead::default()
        }
    }
}

/// Partial update payload. Absent fields stay untouched on MERGE.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_tel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_tel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line_of_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_electricity_costs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_status: Option<SurveyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_booked_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_complete_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_booked_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_assigned_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_paid_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fall_off_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fall_off_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_rep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<LeadSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_paid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_notes: Option<String>,
}

impl LeadUpdate {
    /// Which lead fields this payload touches. Drives the per-role write check.
    pub fn present_fields(&self) -> Vec<LeadField> {
        let mut fields = Vec::new();
        if self.customer_name.is_some() {
            fields.push(LeadField::CustomerName);
        }
        if self.customer_tel.is_some() {
            fields.push(LeadField::CustomerTel);
        }
        if self.alternative_tel.is_some() {
            fields.push(LeadField::AlternativeTel);
        }
        if self.customer_email.is_some() {
            fields.push(LeadField::CustomerEmail);
        }
        if self.first_line_of_address.is_some() {
            fields.push(LeadField::FirstLineOfAddress);
        }
        if self.postcode.is_some() {
            fields.push(LeadField::Postcode);
        }
        if self.property_type.is_some() {
            fields.push(LeadField::PropertyType);
        }
        if self.monthly_electricity_costs.is_some() {
            fields.push(LeadField::MonthlyElectricityCosts);
        }
        if self.status.is_some() {
            fields.push(LeadField::Status);
        }
        if self.survey_status.is_some() {
            fields.push(LeadField::SurveyStatus);
        }
        if self.survey_booked_date.is_some() {
            fields.push(LeadField::SurveyBookedDate);
        }
        if self.survey_complete_date.is_some() {
            fields.push(LeadField::SurveyCompleteDate);
        }
        if self.install_booked_date.is_some() {
            fields.push(LeadField::InstallBookedDate);
        }
        if self.paid_date.is_some() {
            fields.push(LeadField::PaidDate);
        }
        if self.installer_assigned_date.is_some() {
            fields.push(LeadField::InstallerAssignedDate);
        }
        if self.commission_paid_date.is_some() {
            fields.push(LeadField::CommissionPaidDate);
        }
        if self.fall_off_stage.is_some() {
            fields.push(LeadField::FallOffStage);
        }
        if self.fall_off_reason.is_some() {
            fields.push(LeadField::FallOffReason);
        }
        if self.account_manager.is_some() {
            fields.push(LeadField::AccountManager);
        }
        if self.field_rep.is_some() {
            fields.push(LeadField::FieldRep);
        }
        if self.installer.is_some() {
            fields.push(LeadField::Installer);
        }
        if self.lead_source.is_some() {
            fields.push(LeadField::LeadSource);
        }
        if self.lead_cost.is_some() {
            fields.push(LeadField::LeadCost);
        }
        if self.lead_revenue.is_some() {
            fields.push(LeadField::LeadRevenue);
        }
        if self.commission_amount.is_some() {
            fields.push(LeadField::CommissionAmount);
        }
        if self.commission_paid.is_some() {
            fields.push(LeadField::CommissionPaid);
        }
        if self.payment_model.is_some() {
            fields.push(LeadField::PaymentModel);
        }
        if self.notes.is_some() {
            fields.push(LeadField::Notes);
        }
        if self.installer_notes.is_some() {
            fields.push(LeadField::InstallerNotes);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }
}

/// Every mutable lead field, named for the write-permission matrix and
/// for reporting rejected fields back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    CustomerName,
    CustomerTel,
    AlternativeTel,
    CustomerEmail,
    FirstLineOfAddress,
    Postcode,
    PropertyType,
    MonthlyElectricityCosts,
    Status,
    SurveyStatus,
    SurveyBookedDate,
    SurveyCompleteDate,
    InstallBookedDate,
    PaidDate,
    InstallerAssignedDate,
    CommissionPaidDate,
    FallOffStage,
    FallOffReason,
    AccountManager,
    FieldRep,
    Installer,
    LeadSource,
    LeadCost,
    LeadRevenue,
    CommissionAmount,
    CommissionPaid,
    PaymentModel,
    Notes,
    InstallerNotes,
}

impl LeadField {
    pub const ALL: &'static [LeadField] = &[
        LeadField::CustomerName,
        LeadField::CustomerTel,
        LeadField::AlternativeTel,
        LeadField::CustomerEmail,
        LeadField::FirstLineOfAddress,
        LeadField::Postcode,
        LeadField::PropertyType,
        LeadField::MonthlyElectricityCosts,
        LeadField::Status,
        LeadField::SurveyStatus,
        LeadField::SurveyBookedDate,
        LeadField::SurveyCompleteDate,
        LeadField::InstallBookedDate,
        LeadField::PaidDate,
        LeadField::InstallerAssignedDate,
        LeadField::CommissionPaidDate,
        LeadField::FallOffStage,
        LeadField::FallOffReason,
        LeadField::AccountManager,
        LeadField::FieldRep,
        LeadField::Installer,
        LeadField::LeadSource,
        LeadField::LeadCost,
        LeadField::LeadRevenue,
        LeadField::CommissionAmount,
        LeadField::CommissionPaid,
        LeadField::PaymentModel,
        LeadField::Notes,
        LeadField::InstallerNotes,
    ];

    /// Storage column name, also the name echoed in rejection messages
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadField::CustomerName => "customer_name",
            LeadField::CustomerTel => "customer_tel",
            LeadField::AlternativeTel => "alternative_tel",
            LeadField::CustomerEmail => "customer_email",
            LeadField::FirstLineOfAddress => "first_line_of_address",
            LeadField::Postcode => "postcode",
            LeadField::PropertyType => "property_type",
            LeadField::MonthlyElectricityCosts => "monthly_electricity_costs",
            LeadField::Status => "status",
            LeadField::SurveyStatus => "survey_status",
            LeadField::SurveyBookedDate => "survey_booked_date",
            LeadField::SurveyCompleteDate => "survey_complete_date",
            LeadField::InstallBookedDate => "install_booked_date",
            LeadField::PaidDate => "paid_date",
            LeadField::InstallerAssignedDate => "installer_assigned_date",
            LeadField::CommissionPaidDate => "commission_paid_date",
            LeadField::FallOffStage => "fall_off_stage",
            LeadField::FallOffReason => "fall_off_reason",
            LeadField::AccountManager => "account_manager",
            LeadField::FieldRep => "field_rep",
            LeadField::Installer => "installer",
            LeadField::LeadSource => "lead_source",
            LeadField::LeadCost => "lead_cost",
            LeadField::LeadRevenue => "lead_revenue",
            LeadField::CommissionAmount => "commission_amount",
            LeadField::CommissionPaid => "commission_paid",
            LeadField::PaymentModel => "payment_model",
            LeadField::Notes => "notes",
            LeadField::InstallerNotes => "installer_notes",
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metric projection of a lead. Everything the aggregators need, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSnapshot {
    pub created_at: i64,
    #[serde(default)]
    pub survey_booked_date: Option<i64>,
    #[serde(default)]
    pub survey_status: Option<SurveyStatus>,
    #[serde(default)]
    pub lead_source: Option<LeadSource>,
    #[serde(default)]
    pub lead_cost: Option<f64>,
    #[serde(default)]
    pub account_manager: Option<String>,
    #[serde(default)]
    pub field_rep: Option<String>,
}

impl LeadSnapshot {
    /// Survey status counts only once a booked date exists; a stray status
    /// without one is treated as "no survey". A booked survey with no
    /// recorded outcome counts as Pending.
    pub fn effective_survey_status(&self) -> Option<SurveyStatus> {
        self.survey_booked_date
            .map(|_| self.survey_status.unwrap_or(SurveyStatus::Pending))
    }
}
