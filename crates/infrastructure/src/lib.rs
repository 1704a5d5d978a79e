//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_assignment_repository;
mod in_memory_decision_cache;
mod in_memory_role_repository;
mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_role_repository;

pub use in_memory_assignment_repository::InMemoryAssignmentRepository;
pub use in_memory_decision_cache::InMemoryDecisionCache;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_role_repository::PostgresRoleRepository;
