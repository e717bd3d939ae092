mod conditions;
mod controller;
mod endpoint;
mod models;

pub use conditions::{
    build_conditions, month_range, ConditionType, ConditionValue, FilterCondition, MonthRange,
    Operation,
};
pub use controller::{FetchOutcome, VisitFeedController, VisitListState};
pub use endpoint::{VisitsEndpoint, VisitsQuery};
pub use models::{Company, VisitPage, VisitRecord, VisitStats, VisitSummary, VisitType};
