use uuid::Uuid;

/// Caller context carried through every service call.
#[derive(Clone, Debug)]
pub struct Ctx {
    actor: Option<String>,
    req_id: Uuid,
}

impl Ctx {
    pub fn new(actor: Option<String>) -> Self {
        Self {
            actor,
            req_id: Uuid::new_v4(),
        }
    }

    /// Context for work the process starts itself (jobs, migrations).
    pub fn system(name: &str) -> Self {
        Self::new(Some(format!("system:{name}")))
    }

    pub fn actor(&self) -> &str {
        self.actor.as_deref().unwrap_or("anonymous")
    }

    pub fn req_id(&self) -> Uuid {
        self.req_id
    }
}
