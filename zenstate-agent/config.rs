use serde::Serialize;

/// Field edits for one P-State
///
/// Edits are applied in a fixed order: enable, disable, FID, DID, VID,
/// vCore. A vCore request is converted to a VID and overrides `vid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PStateEdit {
    pub enable: bool,
    pub disable: bool,
    pub fid: Option<u8>,
    pub did: Option<u8>,
    pub vid: Option<u8>,
    pub vcore: Option<f64>,
}

/// Everything one invocation is asked to do
///
/// Actions run in the order list, P-State edit, C6 enable, C6 disable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Request {
    pub list: bool,
    /// CPU to read the listing from
    pub cpu: Option<u32>,
    pub pstate: Option<usize>,
    pub edit: PStateEdit,
    pub c6_enable: bool,
    pub c6_disable: bool,
    pub json: bool,
    pub dry_run: bool,
}

impl Request {
    /// True when at least one action would run
    pub fn has_action(&self) -> bool {
        self.list || self.pstate.is_some() || self.c6_enable || self.c6_disable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_actions() {
        assert!(!Request::default().has_action());

        // Output flags alone do nothing
        let request = Request {
            json: true,
            dry_run: true,
            cpu: Some(2),
            ..Default::default()
        };
        assert!(!request.has_action());

        let request = Request {
            pstate: Some(0),
            ..Default::default()
        };
        assert!(request.has_action());
    }
}
