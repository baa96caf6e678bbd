//! Rooted binary Steiner trees over a net's placed pins.
//!
//! The routing tree is a binary tree whose leaves are the net's load pins,
//! whose internal nodes are Steiner points, and whose root is the driver
//! pin. The builder here is a deterministic chain heuristic: sinks are
//! ordered by (Manhattan distance from the driver, path name) and strung
//! together, with each chain point collocated with its sink. Leaf branches
//! therefore have zero length, which downstream extraction bridges with a
//! tiny connectivity resistor.

use vireo_netlist::{Design, NetId, PinId, Point};

/// Index of a point in a [`SteinerTree`].
pub type SteinerPt = u32;

/// A node of the routing tree.
#[derive(Clone, Debug)]
pub struct SteinerNode {
    /// Location of this point in DBU.
    pub location: Point,
    /// The pin at this point, if it is the driver or a sink leaf.
    pub pin: Option<PinId>,
    /// Left child.
    pub left: Option<SteinerPt>,
    /// Right child.
    pub right: Option<SteinerPt>,
}

/// A branch of the routing tree: a parent-child edge with its wire length.
#[derive(Clone, Copy, Debug)]
pub struct SteinerBranch {
    /// Parent point.
    pub from: SteinerPt,
    /// Child point.
    pub to: SteinerPt,
    /// Manhattan wire length in DBU.
    pub length_dbu: i64,
}

/// A rooted binary routing tree for one net.
#[derive(Clone, Debug)]
pub struct SteinerTree {
    nodes: Vec<SteinerNode>,
    root: SteinerPt,
}

impl SteinerTree {
    /// Returns the root point (the driver pin's point).
    pub fn drvr_pt(&self) -> SteinerPt {
        self.root
    }

    /// Returns the left child of a point.
    pub fn left(&self, k: SteinerPt) -> Option<SteinerPt> {
        self.nodes[k as usize].left
    }

    /// Returns the right child of a point.
    pub fn right(&self, k: SteinerPt) -> Option<SteinerPt> {
        self.nodes[k as usize].right
    }

    /// Returns the pin at a point, if any.
    pub fn pin(&self, k: SteinerPt) -> Option<PinId> {
        self.nodes[k as usize].pin
    }

    /// Returns the location of a point.
    pub fn location(&self, k: SteinerPt) -> Point {
        self.nodes[k as usize].location
    }

    /// Returns the number of points in the tree.
    pub fn point_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns all parent-child branches with their Manhattan lengths.
    pub fn branches(&self) -> Vec<SteinerBranch> {
        let mut branches = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            for child in [node.left, node.right].into_iter().flatten() {
                let length_dbu = node
                    .location
                    .manhattan_distance(self.nodes[child as usize].location);
                branches.push(SteinerBranch {
                    from: i as SteinerPt,
                    to: child,
                    length_dbu,
                });
            }
        }
        branches
    }
}

/// Builds the routing tree for a net.
///
/// Returns `None` when the net has no driver or any connected pin lacks a
/// placement location (unplaced geometry is skipped, not an error). The
/// `find_left_right` flag is accepted for interface compatibility; this
/// builder always populates children.
pub fn build_steiner_tree(design: &Design, net: NetId, _find_left_right: bool) -> Option<SteinerTree> {
    let drvr = design.drivers(net).into_iter().next()?;
    let drvr_loc = design.pin_location(drvr)?;

    let mut sinks: Vec<(PinId, Point, String)> = Vec::new();
    for load in design.loads(net) {
        let loc = design.pin_location(load)?;
        sinks.push((load, loc, design.pin_path_name(load)));
    }
    sinks.sort_by(|a, b| {
        let da = drvr_loc.manhattan_distance(a.1);
        let db = drvr_loc.manhattan_distance(b.1);
        da.cmp(&db).then_with(|| a.2.cmp(&b.2))
    });

    let mut nodes = vec![SteinerNode {
        location: drvr_loc,
        pin: Some(drvr),
        left: None,
        right: None,
    }];

    // Chain the sinks farthest-last: each chain point sits at its sink's
    // location, with the sink leaf on the left and the rest of the chain
    // on the right.
    let mut chain: Option<SteinerPt> = None;
    for (pin, location, _) in sinks.iter().rev() {
        let leaf = nodes.len() as SteinerPt;
        nodes.push(SteinerNode {
            location: *location,
            pin: Some(*pin),
            left: None,
            right: None,
        });
        chain = Some(match chain {
            None => leaf,
            Some(rest) => {
                let junction = nodes.len() as SteinerPt;
                nodes.push(SteinerNode {
                    location: *location,
                    pin: None,
                    left: Some(leaf),
                    right: Some(rest),
                });
                junction
            }
        });
    }
    nodes[0].left = chain;

    Some(SteinerTree { nodes, root: 0 })
}
