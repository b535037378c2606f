//! Version-bits deployment table.

pub type Hash256 = [u8; 32];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum DeploymentPos {
    TestDummy = 0,
}

pub const MAX_DEPLOYMENTS: usize = 1;

pub const ALL_DEPLOYMENTS: [DeploymentPos; MAX_DEPLOYMENTS] = [DeploymentPos::TestDummy];

impl DeploymentPos {
    pub const fn as_usize(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        DEPLOYMENT_INFO[self.as_usize()].name
    }

    pub fn parse(raw: &str) -> Option<Self> {
        ALL_DEPLOYMENTS
            .iter()
            .copied()
            .find(|pos| pos.name().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Top three version bits signalling a version-bits block.
pub const VERSIONBITS_TOP_BITS: i32 = 0x2000_0000;
pub const VERSIONBITS_TOP_MASK: u32 = 0xE000_0000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deployment {
    pub bit: u8,
    pub start_time: i64,
    pub timeout: i64,
}

impl Deployment {
    pub fn mask(&self) -> u32 {
        1u32 << self.bit
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DeploymentInfo {
    pub name: &'static str,
}

pub const DEPLOYMENT_INFO: [DeploymentInfo; MAX_DEPLOYMENTS] =
    [DeploymentInfo { name: "testdummy" }];

pub fn version_signals(version: i32, deployment: &Deployment) -> bool {
    let version = version as u32;
    (version & VERSIONBITS_TOP_MASK) == VERSIONBITS_TOP_BITS as u32
        && (version & deployment.mask()) != 0
}
