//! Meeting facet enumerations with display metadata.
//!
//! These are pure lookup tables: nothing in the room state machine depends on
//! which variant is selected. They are stored in the room configuration and
//! exposed over HTTP as versioned static JSON.

use serde::{Deserialize, Serialize};

/// A facet is a closed enumeration with human-facing display metadata.
pub trait Facet: Sized + Copy + 'static {
    const ALL: &'static [Self];

    /// Wire value, `SCREAMING_SNAKE_CASE`.
    fn value(self) -> &'static str;
    fn display_name(self) -> &'static str;
    fn description(self) -> &'static str;

    /// Parse a wire value; unknown or empty input means "unset".
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Self::ALL.iter().copied().find(|v| v.value() == raw)
    }
}

/// One row of a metadata table as served over HTTP.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub value: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
}

/// Full metadata table for a facet.
pub fn table<F: Facet>() -> Vec<MetadataEntry> {
    F::ALL
        .iter()
        .map(|f| MetadataEntry {
            value: f.value(),
            display_name: f.display_name(),
            description: f.description(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingGoal {
    ShareInformation,
    AdvanceThinking,
    ObtainInput,
    MakeDecisions,
    ImproveCommunication,
    BuildCapacity,
    BuildCommunity,
}

impl Facet for MeetingGoal {
    const ALL: &'static [Self] = &[
        Self::ShareInformation,
        Self::AdvanceThinking,
        Self::ObtainInput,
        Self::MakeDecisions,
        Self::ImproveCommunication,
        Self::BuildCapacity,
        Self::BuildCommunity,
    ];

    fn value(self) -> &'static str {
        match self {
            Self::ShareInformation => "SHARE_INFORMATION",
            Self::AdvanceThinking => "ADVANCE_THINKING",
            Self::ObtainInput => "OBTAIN_INPUT",
            Self::MakeDecisions => "MAKE_DECISIONS",
            Self::ImproveCommunication => "IMPROVE_COMMUNICATION",
            Self::BuildCapacity => "BUILD_CAPACITY",
            Self::BuildCommunity => "BUILD_COMMUNITY",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::ShareInformation => "Share Information",
            Self::AdvanceThinking => "Advance the Thinking",
            Self::ObtainInput => "Obtain Input",
            Self::MakeDecisions => "Make Decisions",
            Self::ImproveCommunication => "Improve Communication",
            Self::BuildCapacity => "Build Capacity",
            Self::BuildCommunity => "Build Community",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::ShareInformation => "Ensure everyone has the same facts, updates, or context.",
            Self::AdvanceThinking => {
                "Develop ideas further through discussion, analysis, and reflection."
            }
            Self::ObtainInput => "Gather perspectives, feedback, or expertise from participants.",
            Self::MakeDecisions => "Reach agreement or choose a course of action collaboratively.",
            Self::ImproveCommunication => {
                "Strengthen clarity, understanding, and mutual trust among participants."
            }
            Self::BuildCapacity => {
                "Develop participants' skills, knowledge, or confidence to act effectively."
            }
            Self::BuildCommunity => {
                "Foster relationships, connection, and shared purpose within the group."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationFormat {
    StructuredGoArounds,
    PresentationsAndReports,
    SmallGroups,
    ListingIdeas,
    Jigsaw,
    IndividualWriting,
    MultiTasking,
    OpenDiscussion,
    Fishbowls,
    Tradeshow,
    Scrambler,
    Roleplays,
}

impl Facet for ParticipationFormat {
    const ALL: &'static [Self] = &[
        Self::StructuredGoArounds,
        Self::PresentationsAndReports,
        Self::SmallGroups,
        Self::ListingIdeas,
        Self::Jigsaw,
        Self::IndividualWriting,
        Self::MultiTasking,
        Self::OpenDiscussion,
        Self::Fishbowls,
        Self::Tradeshow,
        Self::Scrambler,
        Self::Roleplays,
    ];

    fn value(self) -> &'static str {
        match self {
            Self::StructuredGoArounds => "STRUCTURED_GO_AROUNDS",
            Self::PresentationsAndReports => "PRESENTATIONS_AND_REPORTS",
            Self::SmallGroups => "SMALL_GROUPS",
            Self::ListingIdeas => "LISTING_IDEAS",
            Self::Jigsaw => "JIGSAW",
            Self::IndividualWriting => "INDIVIDUAL_WRITING",
            Self::MultiTasking => "MULTI_TASKING",
            Self::OpenDiscussion => "OPEN_DISCUSSION",
            Self::Fishbowls => "FISHBOWLS",
            Self::Tradeshow => "TRADESHOW",
            Self::Scrambler => "SCRAMBLER",
            Self::Roleplays => "ROLEPLAYS",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::StructuredGoArounds => "Structured Go-Arounds",
            Self::PresentationsAndReports => "Presentations and Reports",
            Self::SmallGroups => "Small Groups",
            Self::ListingIdeas => "Listing Ideas",
            Self::Jigsaw => "Jigsaw",
            Self::IndividualWriting => "Individual Writing",
            Self::MultiTasking => "Multi-Tasking",
            Self::OpenDiscussion => "Open Discussion",
            Self::Fishbowls => "Fishbowls",
            Self::Tradeshow => "Tradeshow",
            Self::Scrambler => "Scrambler",
            Self::Roleplays => "Roleplays",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::StructuredGoArounds => {
                "Everyone contributes in turn, ensuring equal participation and balanced input."
            }
            Self::PresentationsAndReports => {
                "Individuals or teams share prepared findings or updates with the group."
            }
            Self::SmallGroups => {
                "Participants work in subgroups to explore topics or solve problems collaboratively."
            }
            Self::ListingIdeas => {
                "The group rapidly generates and records ideas without immediate evaluation."
            }
            Self::Jigsaw => {
                "Each subgroup learns part of a topic and teaches it to others, combining knowledge collaboratively."
            }
            Self::IndividualWriting => {
                "Participants reflect or respond in writing before sharing or discussing."
            }
            Self::MultiTasking => {
                "Participants engage in parallel activities contributing to a shared goal or outcome."
            }
            Self::OpenDiscussion => {
                "Participants freely exchange views and reactions in an unstructured conversation."
            }
            Self::Fishbowls => {
                "A small inner group discusses while others observe, then roles switch for reflection and feedback."
            }
            Self::Tradeshow => {
                "Participants display and explain their work or ideas at stations others visit in rotation."
            }
            Self::Scrambler => {
                "Participants move between tasks, stations, or partners to stimulate diverse perspectives."
            }
            Self::Roleplays => {
                "Participants act out scenarios to explore perspectives, behaviors, or problem-solving strategies."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionRule {
    Unanimity,
    GradientsOfAgreement,
    DotVoting,
    Supermajority,
    Majority,
    Plurality,
    Consent,
    PersonInCharge,
    Commission,
    FlipACoin,
}

impl Facet for DecisionRule {
    const ALL: &'static [Self] = &[
        Self::Unanimity,
        Self::GradientsOfAgreement,
        Self::DotVoting,
        Self::Supermajority,
        Self::Majority,
        Self::Plurality,
        Self::Consent,
        Self::PersonInCharge,
        Self::Commission,
        Self::FlipACoin,
    ];

    fn value(self) -> &'static str {
        match self {
            Self::Unanimity => "UNANIMITY",
            Self::GradientsOfAgreement => "GRADIENTS_OF_AGREEMENT",
            Self::DotVoting => "DOT_VOTING",
            Self::Supermajority => "SUPERMAJORITY",
            Self::Majority => "MAJORITY",
            Self::Plurality => "PLURALITY",
            Self::Consent => "CONSENT",
            Self::PersonInCharge => "PERSON_IN_CHARGE",
            Self::Commission => "COMMISSION",
            Self::FlipACoin => "FLIP_A_COIN",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::Unanimity => "Unanimity",
            Self::GradientsOfAgreement => "Gradients of Agreement",
            Self::DotVoting => "Dot Voting",
            Self::Supermajority => "Supermajority",
            Self::Majority => "Majority",
            Self::Plurality => "Plurality",
            Self::Consent => "Consent",
            Self::PersonInCharge => "Person in Charge",
            Self::Commission => "Commission",
            Self::FlipACoin => "Flip a Coin",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Unanimity => "All participants must fully agree before a decision is made.",
            Self::GradientsOfAgreement => {
                "Participants express varying levels of support, revealing nuanced consensus rather than a simple yes/no."
            }
            Self::DotVoting => {
                "Each person allocates a limited number of votes (dots) to indicate preferences or priorities visually."
            }
            Self::Supermajority => {
                "A decision requires a higher-than-simple majority, such as two-thirds or three-quarters agreement."
            }
            Self::Majority => "The option with more than half of the votes wins.",
            Self::Plurality => {
                "The option with the most votes wins, even if it lacks a majority."
            }
            Self::Consent => {
                "A proposal moves forward unless there is a reasoned and paramount objection."
            }
            Self::PersonInCharge => {
                "A designated leader makes the final decision after input from others."
            }
            Self::Commission => {
                "A smaller group or committee is empowered to deliberate and decide on behalf of the whole."
            }
            Self::FlipACoin => {
                "A neutral random choice is used to decide between equally acceptable or deadlocked options."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Deliverable {
    DefineProblem,
    CreateMilestoneMap,
    AnalyzeProblem,
    CreateWorkBreakdown,
    IdentifyRootCauses,
    ConductResourceAnalysis,
    IdentifyPatterns,
    ConductRiskAssessment,
    SortIdeasIntoThemes,
    DefineSelectionCriteria,
    RearrangeByPriority,
    EvaluateOptions,
    DrawFlowchart,
    IdentifySuccessFactors,
    IdentifyCoreValues,
    EditStatement,
}

impl Facet for Deliverable {
    const ALL: &'static [Self] = &[
        Self::DefineProblem,
        Self::CreateMilestoneMap,
        Self::AnalyzeProblem,
        Self::CreateWorkBreakdown,
        Self::IdentifyRootCauses,
        Self::ConductResourceAnalysis,
        Self::IdentifyPatterns,
        Self::ConductRiskAssessment,
        Self::SortIdeasIntoThemes,
        Self::DefineSelectionCriteria,
        Self::RearrangeByPriority,
        Self::EvaluateOptions,
        Self::DrawFlowchart,
        Self::IdentifySuccessFactors,
        Self::IdentifyCoreValues,
        Self::EditStatement,
    ];

    fn value(self) -> &'static str {
        match self {
            Self::DefineProblem => "DEFINE_PROBLEM",
            Self::CreateMilestoneMap => "CREATE_MILESTONE_MAP",
            Self::AnalyzeProblem => "ANALYZE_PROBLEM",
            Self::CreateWorkBreakdown => "CREATE_WORK_BREAKDOWN",
            Self::IdentifyRootCauses => "IDENTIFY_ROOT_CAUSES",
            Self::ConductResourceAnalysis => "CONDUCT_RESOURCE_ANALYSIS",
            Self::IdentifyPatterns => "IDENTIFY_PATTERNS",
            Self::ConductRiskAssessment => "CONDUCT_RISK_ASSESSMENT",
            Self::SortIdeasIntoThemes => "SORT_IDEAS_INTO_THEMES",
            Self::DefineSelectionCriteria => "DEFINE_SELECTION_CRITERIA",
            Self::RearrangeByPriority => "REARRANGE_BY_PRIORITY",
            Self::EvaluateOptions => "EVALUATE_OPTIONS",
            Self::DrawFlowchart => "DRAW_FLOWCHART",
            Self::IdentifySuccessFactors => "IDENTIFY_SUCCESS_FACTORS",
            Self::IdentifyCoreValues => "IDENTIFY_CORE_VALUES",
            Self::EditStatement => "EDIT_STATEMENT",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::DefineProblem => "Define a problem",
            Self::CreateMilestoneMap => "Create a milestone map",
            Self::AnalyzeProblem => "Analyze a problem",
            Self::CreateWorkBreakdown => "Create a work breakdown structure",
            Self::IdentifyRootCauses => "Identify root causes",
            Self::ConductResourceAnalysis => "Conduct a resource analysis",
            Self::IdentifyPatterns => "Identify underlying patterns",
            Self::ConductRiskAssessment => "Conduct a risk assessment",
            Self::SortIdeasIntoThemes => "Sort a list of ideas into themes",
            Self::DefineSelectionCriteria => "Define selection criteria",
            Self::RearrangeByPriority => "Rearrange a list of items by priority",
            Self::EvaluateOptions => "Evaluate options",
            Self::DrawFlowchart => "Draw a flowchart",
            Self::IdentifySuccessFactors => "Identify critical success factors",
            Self::IdentifyCoreValues => "Identify core values",
            Self::EditStatement => "Edit and/or wordsmith a statement",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::DefineProblem => {
                "Clearly articulate the issue or challenge that needs to be addressed"
            }
            Self::CreateMilestoneMap => {
                "Identify key checkpoints and timeline for project phases"
            }
            Self::AnalyzeProblem => "Examine causes, effects, and context of the issue in depth",
            Self::CreateWorkBreakdown => {
                "Break down the project into manageable tasks and subtasks"
            }
            Self::IdentifyRootCauses => "Determine the fundamental reasons behind the problem",
            Self::ConductResourceAnalysis => {
                "Assess available resources including time, budget, and personnel"
            }
            Self::IdentifyPatterns => {
                "Recognize recurring themes or trends in the data or situation"
            }
            Self::ConductRiskAssessment => {
                "Evaluate potential risks and their impact on the project"
            }
            Self::SortIdeasIntoThemes => "Organize and categorize ideas into coherent groups",
            Self::DefineSelectionCriteria => {
                "Establish the standards for evaluating and choosing options"
            }
            Self::RearrangeByPriority => {
                "Order items based on importance, urgency, or value"
            }
            Self::EvaluateOptions => {
                "Assess and compare different alternatives against criteria"
            }
            Self::DrawFlowchart => {
                "Create a visual diagram showing process steps and decision points"
            }
            Self::IdentifySuccessFactors => {
                "Determine the key elements necessary for success"
            }
            Self::IdentifyCoreValues => {
                "Define the fundamental principles guiding decisions and actions"
            }
            Self::EditStatement => {
                "Refine and improve the clarity and impact of written text"
            }
        }
    }
}
