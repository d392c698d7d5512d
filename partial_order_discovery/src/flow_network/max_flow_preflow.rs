use serde::{Deserialize, Serialize};

/// Residuals and excesses below this are treated as zero
const EPSILON: f64 = 1e-9;

/// Errors of [`MaxFlowPreflowN3`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaxFlowError {
    /// A node index is not below the number of nodes
    #[error("node {index} does not exist in a network of {nodes} nodes")]
    InvalidNode {
        /// The offending index
        index: usize,
        /// Number of nodes of the network
        nodes: usize,
    },
    /// Source and sink coincide
    #[error("source and sink are both node {0}")]
    SourceIsSink(usize),
    /// Capacities have to be non-negative numbers
    #[error("invalid capacity {cap} for arc ({from}, {to})")]
    InvalidCapacity {
        /// Start of the arc
        from: usize,
        /// End of the arc
        to: usize,
        /// The offending capacity
        cap: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Maximum flow together with the flow on every arc
pub struct MaxFlowAssignment {
    /// Value of the maximum flow (`f64::INFINITY` if unbounded)
    pub value: f64,
    /// `flow[i][j]` is the (non-negative) flow sent from `i` to `j`
    pub flow: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
///
/// Highest-label preflow-push maximum flow solver on a dense capacity matrix
///
/// Runs in `O(n³)` for `n` nodes. Arcs are unbounded if set via
/// [`MaxFlowPreflowN3::set_unbounded`] (or with an infinite capacity); missing arcs
/// have capacity 0.
///
pub struct MaxFlowPreflowN3 {
    n: usize,
    cap: Vec<Vec<f64>>,
    unbounded: Vec<Vec<bool>>,
}

impl MaxFlowPreflowN3 {
    /// Create a network of `n` nodes without arcs
    pub fn new(n: usize) -> Self {
        Self {
            n,
            cap: vec![vec![0.0; n]; n],
            unbounded: vec![vec![false; n]; n],
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.n
    }

    /// `true` for a network without nodes
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    fn check_node(&self, index: usize) -> Result<(), MaxFlowError> {
        if index < self.n {
            Ok(())
        } else {
            Err(MaxFlowError::InvalidNode {
                index,
                nodes: self.n,
            })
        }
    }

    /// Set the capacity of the arc from `i` to `j`
    pub fn set_cap(&mut self, i: usize, j: usize, cap: f64) -> Result<(), MaxFlowError> {
        self.check_node(i)?;
        self.check_node(j)?;
        if cap.is_nan() || cap < 0.0 {
            return Err(MaxFlowError::InvalidCapacity {
                from: i,
                to: j,
                cap,
            });
        }
        if cap.is_infinite() {
            self.unbounded[i][j] = true;
            self.cap[i][j] = 0.0;
        } else {
            self.unbounded[i][j] = false;
            self.cap[i][j] = cap;
        }
        Ok(())
    }

    /// Give the arc from `i` to `j` unlimited capacity
    pub fn set_unbounded(&mut self, i: usize, j: usize) -> Result<(), MaxFlowError> {
        self.set_cap(i, j, f64::INFINITY)
    }

    /// Value of a maximum flow from `s` to `t`
    pub fn max_flow(&self, s: usize, t: usize) -> Result<f64, MaxFlowError> {
        Ok(self.max_flow_assignment(s, t)?.value)
    }

    ///
    /// Compute a maximum flow from `s` to `t`
    ///
    /// Unbounded arcs are given a capacity exceeding the sum of all finite capacities.
    /// If the flow reaches that bound, the value is reported as `f64::INFINITY`
    /// (the per-arc flows then show one bounded witness).
    ///
    pub fn max_flow_assignment(
        &self,
        s: usize,
        t: usize,
    ) -> Result<MaxFlowAssignment, MaxFlowError> {
        self.check_node(s)?;
        self.check_node(t)?;
        if s == t {
            return Err(MaxFlowError::SourceIsSink(s));
        }
        let n = self.n;

        let bound: f64 = self.cap.iter().flatten().sum::<f64>() + 1.0;
        let cap: Vec<Vec<f64>> = self
            .cap
            .iter()
            .zip(&self.unbounded)
            .map(|(row, unbounded)| {
                row.iter()
                    .zip(unbounded)
                    .map(|(c, u)| if *u { bound } else { *c })
                    .collect()
            })
            .collect();

        let mut h = vec![0_usize; n];
        let mut e = vec![0.0_f64; n];
        let mut f = vec![vec![0.0_f64; n]; n];
        h[s] = n - 1;
        for i in 0..n {
            f[s][i] = cap[s][i];
            f[i][s] = -cap[s][i];
            e[i] = cap[s][i];
        }

        // Active nodes sharing the highest height
        let mut maxh: Vec<usize> = Vec::with_capacity(n);
        loop {
            if maxh.is_empty() {
                for i in 0..n {
                    if i == s || i == t || e[i] <= EPSILON {
                        continue;
                    }
                    if let Some(&top) = maxh.first() {
                        if h[i] > h[top] {
                            maxh.clear();
                        } else if h[i] < h[top] {
                            continue;
                        }
                    }
                    maxh.push(i);
                }
            }
            let Some(&top) = maxh.first() else {
                break;
            };
            let mut top_height = h[top];

            while let Some(&i) = maxh.last() {
                let mut pushed = false;
                for j in 0..n {
                    if e[i] <= 0.0 {
                        break;
                    }
                    let residual = cap[i][j] - f[i][j];
                    if h[i] == h[j] + 1 && residual > EPSILON {
                        let df = residual.min(e[i]);
                        f[i][j] += df;
                        f[j][i] -= df;
                        e[i] -= df;
                        e[j] += df;
                        if e[i] <= EPSILON {
                            e[i] = 0.0;
                            maxh.pop();
                        }
                        pushed = true;
                    }
                }
                if !pushed {
                    h[i] = (0..n)
                        .filter(|j| cap[i][*j] - f[i][*j] > EPSILON)
                        .map(|j| h[j].saturating_add(1))
                        .min()
                        .unwrap_or(usize::MAX);
                    if h[i] > top_height {
                        if maxh.len() > 1 {
                            maxh.clear();
                            break;
                        }
                        top_height = h[i];
                    }
                }
            }
        }

        let value: f64 = f[s].iter().sum();
        let value = if value >= bound - EPSILON {
            f64::INFINITY
        } else {
            value
        };
        let flow = f
            .into_iter()
            .map(|row| row.into_iter().map(|x| x.max(0.0)).collect())
            .collect();
        log::trace!("Max flow from {s} to {t} in a network of {n} nodes: {value}");
        Ok(MaxFlowAssignment { value, flow })
    }
}
