//! Recombination events shared between the VJ and VDJ models
use crate::shared::sequence::Dna;
use crate::vdj::StaticEvent as VDJStaticEvent;
use crate::vj::StaticEvent as VJStaticEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    VJ(VJStaticEvent),
    VDJ(VDJStaticEvent),
}

impl Event {
    pub fn v_index(&self) -> usize {
        match self {
            Event::VJ(x) => x.v_index,
            Event::VDJ(x) => x.v_index,
        }
    }

    pub fn j_index(&self) -> usize {
        match self {
            Event::VJ(x) => x.j_index,
            Event::VDJ(x) => x.j_index,
        }
    }

    pub fn d_index(&self) -> Option<usize> {
        match self {
            Event::VJ(_) => None,
            Event::VDJ(x) => Some(x.d_index),
        }
    }

    pub fn delv(&self) -> usize {
        match self {
            Event::VJ(x) => x.delv,
            Event::VDJ(x) => x.delv,
        }
    }

    pub fn delj(&self) -> usize {
        match self {
            Event::VJ(x) => x.delj,
            Event::VDJ(x) => x.delj,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Event::VJ(x) => write!(
                f,
                "V{} J{} del. V3: {} del. J5: {} ins. VJ: {}",
                x.v_index, x.j_index, x.delv, x.delj, x.insvj
            ),
            Event::VDJ(x) => write!(
                f,
                "V{} D{} J{} del. V3: {} del. D5: {} del. D3: {} del. J5: {} ins. VD: {} ins. DJ: {}",
                x.v_index,
                x.d_index,
                x.j_index,
                x.delv,
                x.deld5,
                x.deld3,
                x.delj,
                x.insvd,
                x.insdj
            ),
        }
    }
}

/// A drawn event together with its assembled (in-frame) CDR3
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cdr3Draw {
    pub cdr3: Dna,
    pub event: Event,
}
