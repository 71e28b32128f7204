use anyhow::Result;

/// Subscription oracle. Purchases and restores report whether premium is
/// active afterwards.
pub trait EntitlementService: Send {
    fn is_premium(&self) -> Result<bool>;
    fn purchase(&mut self) -> Result<bool>;
    fn restore(&mut self) -> Result<bool>;
}

/// Entitlement held in-process; purchasing always succeeds.
#[derive(Debug, Default)]
pub struct LocalEntitlement {
    granted: bool,
}

impl LocalEntitlement {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

impl EntitlementService for LocalEntitlement {
    fn is_premium(&self) -> Result<bool> {
        Ok(self.granted)
    }

    fn purchase(&mut self) -> Result<bool> {
        self.granted = true;
        Ok(true)
    }

    fn restore(&mut self) -> Result<bool> {
        Ok(self.granted)
    }
}
