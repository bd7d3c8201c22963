use utoipa::OpenApi;

use crate::authz::RoleKind;
use crate::models::rbac::{AccessCheckRequest, AccessCheckResponse, ProjectRole, RoleAssignRequest};
use crate::routes::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
	paths(
		crate::routes::health::health,
		crate::routes::rbac::check_access,
		crate::routes::rbac::get_role,
		crate::routes::rbac::assign_role,
		crate::routes::rbac::remove_role
	),
	components(
		schemas(
			HealthResponse,
			RoleKind,
			ProjectRole,
			RoleAssignRequest,
			AccessCheckRequest,
			AccessCheckResponse
		)
	),
	tags(
		(name = "Health", description = "Service health"),
		(name = "Access", description = "Policy decisions"),
		(name = "Roles", description = "Project role assignment")
	)
)]
pub struct ApiDoc;
