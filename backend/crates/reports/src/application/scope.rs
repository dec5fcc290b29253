//! Report scope of a session

use auth::domain::entity::session::Session;
use kernel::error::app_error::AppError;
use kernel::organization::OrganizationType;

use crate::domain::filter::ReportScope;
use crate::domain::repository::GameDirectory;
use crate::error::ReportResult;

/// Root sees everything; everyone else sees their current organization's slice
pub async fn resolve_scope<D: GameDirectory>(
    directory: &D,
    session: &Session,
) -> ReportResult<ReportScope> {
    if session.account.has_root_role() {
        return Ok(ReportScope::Unrestricted);
    }
    let organization = session
        .organization
        .as_ref()
        .ok_or_else(|| AppError::unauthorized("No organization selected"))?;

    Ok(match organization.organization_type {
        OrganizationType::Integrator => ReportScope::Integrator(organization.name.clone()),
        OrganizationType::Operator => ReportScope::Operator(organization.name.clone()),
        OrganizationType::Provider => {
            ReportScope::Provider(directory.provider_games(organization.id).await?)
        }
    })
}
