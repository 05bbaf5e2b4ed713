mod acl;

pub use acl::RequireRoles;
