/*****************************************************************************************[core.rs]
Copyright (c) 2023-2024, Andrew Haberlandt, Harrison Green, Marijn J.H. Heule (SBVA)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

//! The formula store and the replacement engine.
//!
//! A [`Formula`] owns the clause store, the per-literal occurrence index,
//! the lazy variable co-occurrence matrix and the proof trail. [`Formula::run`]
//! performs structured bounded variable addition: it repeatedly grows a
//! rectangular "tile" of clauses sharing structure, and when replacing the
//! tile with bridge clauses through a fresh variable shrinks the formula,
//! commits the substitution.

use crate::clause::{Clause, ClauseId, Lit, OccVec, Var};
use crate::drat::Proof;
use crate::map::{LitMap, LitSet, VarMap};
use crate::sparse::SparseVec;
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::io::{self, Write};
use std::mem;

/// How to break ties between equally frequent tile-extension candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tiebreak {
    /// Take the first candidate in literal order.
    None,
    /// Prefer the candidate with the heaviest three-hop neighborhood
    /// around the seed literal.
    ThreeHop,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Work budget. Ingest and the engine both decrement it; once negative
    /// the engine stops at the next outer iteration and keeps the partially
    /// rewritten formula.
    pub steps: i64,
    /// Stop after this many substitutions (0 = unbounded).
    pub max_replacements: u64,
    /// Together with `matched_cls_cutoff`: a grown tile is discarded unless
    /// it has more than `matched_lits_cutoff` literals or more than
    /// `matched_cls_cutoff` clauses.
    pub matched_lits_cutoff: u64,
    pub matched_cls_cutoff: u64,
    /// Record every clause addition and deletion in a DRAT trail.
    pub generate_proof: bool,
    /// Add one extra blocking clause per substitution so the number of
    /// models is preserved exactly, not just satisfiability.
    pub preserve_model_cnt: bool,
    /// Diagnostic chatter level for embedding drivers.
    pub verbosity: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            steps: i64::MAX,
            max_replacements: 0,
            matched_lits_cutoff: 0,
            matched_cls_cutoff: 0,
            generate_proof: false,
            preserve_model_cnt: false,
            verbosity: 0,
        }
    }
}

/// Clauses saved by replacing an `lits x clauses` tile with `lits + clauses`
/// bridge clauses.
#[inline]
fn reduction(lits: i64, clauses: i64) -> i64 {
    lits * clauses - (lits + clauses)
}

/// Partial difference `a \ b` of sorted literal slices, keeping at most
/// `max_diff + 1` entries. Returns the number of merge steps taken, for
/// budget accounting.
fn clause_diff(a: &[Lit], b: &[Lit], diff: &mut Vec<Lit>, max_diff: usize) -> i64 {
    diff.clear();
    let mut ia = 0;
    let mut ib = 0;
    let mut steps = 0i64;
    while ia < a.len() && ib < b.len() && diff.len() <= max_diff {
        steps += 1;
        if a[ia] == b[ib] {
            ia += 1;
            ib += 1;
        } else if a[ia].to_dimacs() < b[ib].to_dimacs() {
            diff.push(a[ia]);
            ia += 1;
        } else {
            ib += 1;
        }
    }
    while ia < a.len() && diff.len() <= max_diff {
        diff.push(a[ia]);
        ia += 1;
    }
    steps
}

type DedupCache = HashMap<u32, SmallVec<[ClauseId; 2]>>;

pub struct Formula {
    opts: Config,
    initialized: bool,
    num_vars: u32,
    /// Tombstoned clauses, counted so live size is `clauses.len() - adj_deleted`.
    adj_deleted: usize,
    num_replacements: u64,
    clauses: Vec<Clause>,
    /// Ingest-time deduplication, keyed by clause hash. `None` once finished.
    cache: Option<DedupCache>,
    /// For each literal, the clauses it appears in, in insertion order.
    /// Tombstoned ids stay in place; `adjust` compensates the counts.
    occ: LitMap<OccVec>,
    adjust: LitMap<i32>,
    /// Per-variable co-occurrence rows. A row with no stored entries means
    /// "not yet computed".
    matrix: VarMap<SparseVec>,
    matrix_width: u32,
    three_hop_cache: HashMap<u32, i64>,
    proof: Proof,
}

impl Formula {
    pub fn new(opts: Config) -> Self {
        Formula {
            opts,
            initialized: false,
            num_vars: 0,
            adj_deleted: 0,
            num_replacements: 0,
            clauses: Vec::new(),
            cache: None,
            occ: LitMap::new(),
            adjust: LitMap::new(),
            matrix: VarMap::new(),
            matrix_width: 0,
            three_hop_cache: HashMap::new(),
            proof: Proof::new(),
        }
    }

    /// Allocate per-literal structures for `num_vars` variables and open
    /// ingest. Must be called exactly once, before any `add_cl`.
    pub fn init_cnf(&mut self, num_vars: u32) {
        assert!(!self.initialized, "init_cnf: already initialized");
        self.num_vars = num_vars;
        self.occ.grow_to(num_vars);
        self.adjust.grow_to(num_vars);
        self.matrix.grow_to(num_vars);
        self.matrix_width = num_vars * 4;
        self.cache = Some(DedupCache::new());
        self.initialized = true;
    }

    /// Append one clause. Literals are sorted and deduplicated internally;
    /// a clause identical to an earlier one is stored tombstoned and does
    /// not enter the occurrence index.
    pub fn add_cl(&mut self, cl_lits: &[i32]) {
        assert!(self.initialized, "add_cl: init_cnf has not been called");
        assert!(self.cache.is_some(), "add_cl: ingest already finished");
        let mut lits = Vec::with_capacity(cl_lits.len());
        for &l in cl_lits {
            assert!(l != 0);
            assert!(
                l.abs() as u32 <= self.num_vars,
                "add_cl: variable {} out of range",
                l.abs()
            );
            lits.push(Lit::from_dimacs(l));
        }
        self.admit_lits(lits);
    }

    /// Shared admission path for both ingest front-ends.
    pub(crate) fn admit_clause(&mut self, lits: &[Lit]) {
        self.admit_lits(lits.to_vec());
    }

    fn admit_lits(&mut self, lits: Vec<Lit>) {
        let cl = Clause::new(lits);
        self.opts.steps -= cl.len() as i64;
        let cid = ClauseId(self.clauses.len() as u32);

        let cache = self.cache.as_mut().expect("ingest is finished");
        let bucket = cache.entry(cl.hash_val()).or_default();
        let clauses = &self.clauses;
        let duplicate = bucket.iter().any(|&old| clauses[old.idx()].lits == cl.lits);

        let mut cl = cl;
        if duplicate {
            cl.deleted = true;
            self.adj_deleted += 1;
        } else {
            bucket.push(cid);
            for &l in &cl.lits {
                self.opts.steps -= 1;
                self.occ[l].push(cid);
            }
        }
        self.clauses.push(cl);
    }

    /// Freeze ingest: drop the dedup cache and warm the adjacency rows.
    pub fn finish_cnf(&mut self) {
        assert!(self.initialized, "finish_cnf: init_cnf has not been called");
        assert!(self.cache.is_some(), "finish_cnf: already finished");
        self.cache = None;
        for v in 0..self.num_vars {
            self.update_adjacency(Var::from_idx(v));
        }
    }

    #[inline]
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    /// Size of the clause store, tombstones included.
    #[inline]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    #[inline]
    pub fn num_live_clauses(&self) -> usize {
        self.clauses.len() - self.adj_deleted
    }

    #[inline]
    pub fn num_replacements(&self) -> u64 {
        self.num_replacements
    }

    pub fn proof(&self) -> &Proof {
        &self.proof
    }

    /// Remaining work budget (negative once exhausted).
    pub fn remaining_steps(&self) -> i64 {
        self.opts.steps
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Number of live clauses containing `l`: occurrence-list length plus
    /// the (nonpositive) tombstone adjustment.
    #[inline]
    pub fn effective_count(&self, l: Lit) -> u32 {
        (self.occ[l].len() as i64 + self.adjust[l] as i64) as u32
    }

    /// The live clauses containing `l`, in occurrence order.
    pub fn iter_live(&self, l: Lit) -> impl Iterator<Item = ClauseId> + '_ {
        self.occ[l]
            .iter()
            .copied()
            .filter(move |cid| !self.clauses[cid.idx()].deleted)
    }

    /// Least frequent literal of the clause, the seed literal excepted.
    /// `None` for a unit clause consisting of the seed alone.
    fn least_frequent_not(&self, cid: ClauseId, skip: Lit) -> Option<Lit> {
        let mut lmin: Option<Lit> = None;
        let mut lmin_count = 0u32;
        for &l in &self.clauses[cid.idx()].lits {
            if l == skip {
                continue;
            }
            let count = self.effective_count(l);
            if lmin.is_none() || count < lmin_count {
                lmin = Some(l);
                lmin_count = count;
            }
        }
        lmin
    }

    /// Build the co-occurrence row of `v` if it is not cached: one entry per
    /// variable column, counting live clauses containing both `v` (either
    /// polarity) and that column's variable.
    fn update_adjacency(&mut self, v: Var) {
        if self.matrix[v].nnz() > 0 {
            return; // cached
        }
        let mut vec = SparseVec::new(self.matrix_width);
        for &sign in &[true, false] {
            let l = Lit::new(v, sign);
            for k in 0..self.occ[l].len() {
                self.opts.steps -= 1;
                let cid = self.occ[l][k];
                let cls = &self.clauses[cid.idx()];
                if cls.deleted {
                    continue;
                }
                for &m in &cls.lits {
                    vec.coeff_add(m.var().idx(), 1);
                }
            }
        }
        self.matrix[v] = vec;
    }

    /// Weighted count of three-hop paths `v1 - x - y - v2` over the
    /// co-occurrence graph; the tiebreak score between a seed literal's
    /// variable and a candidate's. Memoized per candidate until the next
    /// outer iteration.
    fn three_hop(&mut self, v1: Var, v2: Var) -> i64 {
        if let Some(&cached) = self.three_hop_cache.get(&v2.idx()) {
            return cached;
        }
        self.update_adjacency(v1);
        self.update_adjacency(v2);

        let mut total = 0i64;
        for k in 0..self.matrix[v2].nnz() {
            self.opts.steps -= 1;
            let (col, count) = self.matrix[v2].entry(k);
            let x = Var::from_idx(col);
            self.update_adjacency(x);
            total += count as i64 * self.matrix[x].dot(&self.matrix[v1]);
        }
        self.three_hop_cache.insert(v2.idx(), total);
        total
    }

    /// Run the replacement search until the queue drains, the step budget
    /// goes negative, or the replacement cap is hit.
    pub fn run(&mut self, tiebreak: Tiebreak) {
        assert!(self.initialized, "run: init_cnf has not been called");
        debug_assert!(self.cache.is_none(), "run: finish_cnf has not been called");

        // Stale-tolerant queue of (effective count, literal), count
        // descending with the smallest literal winning ties. No
        // decrease-key: entries whose count no longer matches are skipped.
        let mut pq: BinaryHeap<(u32, Reverse<Lit>)> = BinaryHeap::new();
        for v in 0..self.num_vars {
            let l = Var::from_idx(v).pos_lit();
            pq.push((self.effective_count(l), Reverse(l)));
            pq.push((self.effective_count(!l), Reverse(!l)));
        }

        let mut matched_lits: Vec<Lit> = Vec::new();
        let mut matched_clauses: Vec<ClauseId> = Vec::new();
        let mut matched_clauses_swap: Vec<ClauseId> = Vec::new();
        // For each entry of `matched_clauses`, its position in the seed
        // literal's occurrence list: a stable column identity for the tile.
        let mut matched_clauses_id: Vec<u32> = Vec::new();
        let mut matched_clauses_id_swap: Vec<u32> = Vec::new();
        // (clause, column id) pairs that become tile rows; filtered against
        // the surviving columns when the substitution commits.
        let mut clauses_to_remove: Vec<(ClauseId, u32)> = Vec::new();
        // Tile extension candidates: (literal, its clause, index into
        // `matched_clauses` of the column it extends).
        let mut matched_entries: Vec<(Lit, ClauseId, u32)> = Vec::new();
        let mut matched_entries_lits: Vec<Lit> = Vec::new();
        let mut ties: Vec<Lit> = Vec::new();
        let mut diff: Vec<Lit> = Vec::new();
        let mut dirty_lits = LitSet::new();

        while let Some((count, Reverse(var))) = pq.pop() {
            if self.opts.steps < 0 {
                debug!("stopping: step budget exhausted");
                return;
            }
            if self.opts.max_replacements != 0
                && self.num_replacements == self.opts.max_replacements
            {
                debug!("stopping: replacement cap {} reached", self.opts.max_replacements);
                return;
            }

            matched_lits.clear();
            matched_clauses.clear();
            matched_clauses_id.clear();
            clauses_to_remove.clear();
            self.three_hop_cache.clear();

            // lazy deletion: act only on entries that are still accurate
            if count == 0 || count != self.effective_count(var) {
                continue;
            }

            trace!("trying {:?} ({})", var, count);

            matched_lits.push(var);
            for i in 0..self.occ[var].len() {
                self.opts.steps -= 1;
                let cid = self.occ[var][i];
                if !self.clauses[cid.idx()].deleted {
                    matched_clauses.push(cid);
                    matched_clauses_id.push(i as u32);
                    clauses_to_remove.push((cid, i as u32));
                }
            }

            loop {
                matched_entries.clear();
                matched_entries_lits.clear();

                // Collect candidates: for each tile column C, scan the
                // occurrence list of C's rarest non-seed literal for live
                // same-length clauses D with C \ D = {var} and |D \ C| = 1.
                for i in 0..matched_clauses.len() {
                    self.opts.steps -= 1;
                    let cid = matched_clauses[i];
                    let lmin = match self.least_frequent_not(cid, var) {
                        Some(l) => l,
                        None => continue,
                    };
                    for k in 0..self.occ[lmin].len() {
                        self.opts.steps -= 1;
                        let did = self.occ[lmin][k];
                        if self.clauses[did.idx()].deleted {
                            continue;
                        }
                        if self.clauses[did.idx()].len() != self.clauses[cid.idx()].len() {
                            continue;
                        }
                        let n = clause_diff(
                            &self.clauses[cid.idx()].lits,
                            &self.clauses[did.idx()].lits,
                            &mut diff,
                            2,
                        );
                        self.opts.steps -= n;
                        if !(diff.len() == 1 && diff[0] == var) {
                            continue;
                        }
                        let n = clause_diff(
                            &self.clauses[did.idx()].lits,
                            &self.clauses[cid.idx()].lits,
                            &mut diff,
                            2,
                        );
                        self.opts.steps -= n;
                        if diff.len() != 1 {
                            continue;
                        }
                        let m = diff[0];
                        if !matched_lits.contains(&m) {
                            matched_entries.push((m, did, i as u32));
                            matched_entries_lits.push(m);
                        }
                    }
                }

                // Most frequent candidate literal, ties collected aside.
                self.opts.steps -= matched_entries_lits.len() as i64;
                matched_entries_lits.sort_unstable_by_key(|l| l.to_dimacs());

                let mut lmax: Option<Lit> = None;
                let mut lmax_count = 0usize;
                ties.clear();
                let mut i2 = 0;
                while i2 < matched_entries_lits.len() {
                    let lit = matched_entries_lits[i2];
                    let mut c = 0usize;
                    while i2 < matched_entries_lits.len() && matched_entries_lits[i2] == lit {
                        self.opts.steps -= 1;
                        c += 1;
                        i2 += 1;
                    }
                    if c > lmax_count {
                        lmax = Some(lit);
                        lmax_count = c;
                        ties.clear();
                        ties.push(lit);
                    } else if c == lmax_count {
                        ties.push(lit);
                    }
                }

                let mut lmax = match lmax {
                    Some(l) => l,
                    None => break,
                };

                // Grow only while the reduction metric strictly improves.
                let current_reduction =
                    reduction(matched_lits.len() as i64, matched_clauses.len() as i64);
                let new_reduction = reduction(matched_lits.len() as i64 + 1, lmax_count as i64);
                if new_reduction <= current_reduction {
                    break;
                }

                if ties.len() > 1 && tiebreak == Tiebreak::ThreeHop {
                    let mut best = self.three_hop(var.var(), ties[0].var());
                    for &t in ties.iter().skip(1) {
                        self.opts.steps -= 1;
                        let h = self.three_hop(var.var(), t.var());
                        if h > best {
                            best = h;
                            lmax = t;
                        }
                    }
                }

                matched_lits.push(lmax);

                // Keep only the columns where lmax occurred, in stable order.
                matched_clauses_swap.clear();
                matched_clauses_id_swap.clear();
                for &(lit, did, idx) in &matched_entries {
                    self.opts.steps -= 1;
                    if lit != lmax {
                        continue;
                    }
                    matched_clauses_swap.push(matched_clauses[idx as usize]);
                    matched_clauses_id_swap.push(matched_clauses_id[idx as usize]);
                    clauses_to_remove.push((did, matched_clauses_id[idx as usize]));
                }
                mem::swap(&mut matched_clauses, &mut matched_clauses_swap);
                mem::swap(&mut matched_clauses_id, &mut matched_clauses_id_swap);

                trace!("Mlit {:?}, Mcls {:?}", matched_lits, matched_clauses);
            }

            if matched_lits.len() == 1 {
                continue;
            }
            if matched_lits.len() as u64 <= self.opts.matched_lits_cutoff
                && matched_clauses.len() as u64 <= self.opts.matched_cls_cutoff
            {
                continue;
            }

            let matched_lit_count = matched_lits.len();
            let matched_clause_count = matched_clauses.len();
            debug!(
                "replacing a {} x {} tile seeded at {:?}",
                matched_lit_count, matched_clause_count, var
            );

            // Fresh auxiliary variable.
            self.num_vars += 1;
            let new_var = Var::from_idx(self.num_vars - 1);
            let f_pos = new_var.pos_lit();
            let f_neg = !f_pos;

            self.occ.grow_to(self.num_vars);
            self.adjust.grow_to(self.num_vars);
            if new_var.idx() >= self.matrix_width {
                // rows are built at a fixed column width; growing past it
                // forces a wholesale rebuild at the new width
                self.matrix_width = self.num_vars * 2;
                self.matrix.clear();
            }
            self.matrix.grow_to(self.num_vars);

            // Bridge clauses (m v f), one per matched literal.
            for i in 0..matched_lit_count {
                self.opts.steps -= 1;
                let m = matched_lits[i];
                let cid = ClauseId(self.clauses.len() as u32);
                self.occ[m].push(cid);
                self.occ[f_pos].push(cid);
                if self.opts.generate_proof {
                    // the fresh variable leads: it is the RAT pivot
                    self.proof.add_clause(&[f_pos, m]);
                }
                // f is the greatest DIMACS value, so the pair is sorted
                self.clauses.push(Clause::from_sorted(vec![m, f_pos]));
            }

            // Replacement clauses (-f v (C \ {var})), one per tile column.
            for i in 0..matched_clause_count {
                self.opts.steps -= 1;
                let src = matched_clauses[i];
                let cid = ClauseId(self.clauses.len() as u32);
                let mut lits = Vec::with_capacity(self.clauses[src.idx()].len());
                lits.push(f_neg);
                for k in 0..self.clauses[src.idx()].lits.len() {
                    let m = self.clauses[src.idx()].lits[k];
                    if m != var {
                        lits.push(m);
                        self.occ[m].push(cid);
                    }
                }
                self.occ[f_neg].push(cid);
                if self.opts.generate_proof {
                    self.proof.add_clause(&lits);
                }
                // -f is the least DIMACS value, so the vector is sorted
                self.clauses.push(Clause::from_sorted(lits));
            }

            // A model is gained only when every matched literal and every
            // tile column is already satisfied; forbidding f there keeps the
            // model count exact.
            if self.opts.preserve_model_cnt {
                let cid = ClauseId(self.clauses.len() as u32);
                let mut lits = Vec::with_capacity(matched_lit_count + 1);
                lits.push(f_neg);
                for &m in matched_lits.iter() {
                    lits.push(!m);
                }
                for &l in &lits {
                    self.occ[l].push(cid);
                }
                if self.opts.generate_proof {
                    self.proof.add_clause(&lits);
                }
                self.clauses.push(Clause::new(lits));
            }

            // Tombstone the tile: every removal candidate whose column
            // survived into the final Mcls.
            let mut valid_ids: HashSet<u32> = HashSet::with_capacity(matched_clause_count);
            for i in 0..matched_clause_count {
                self.opts.steps -= 1;
                valid_ids.insert(matched_clauses_id[i]);
            }

            dirty_lits.clear();
            let mut removed = 0usize;
            for &(cid, col) in &clauses_to_remove {
                if !valid_ids.contains(&col) {
                    continue;
                }
                self.clauses[cid.idx()].deleted = true;
                removed += 1;
                for k in 0..self.clauses[cid.idx()].lits.len() {
                    self.opts.steps -= 1;
                    let l = self.clauses[cid.idx()].lits[k];
                    self.adjust[l] -= 1;
                    dirty_lits.insert(l);
                }
                if self.opts.generate_proof {
                    self.proof.delete_clause(&self.clauses[cid.idx()].lits);
                }
            }
            self.adj_deleted += removed;

            // Requeue everything whose count moved, and drop their stale
            // adjacency rows.
            for l in dirty_lits.iter() {
                pq.push((self.effective_count(l), Reverse(l)));
                self.matrix[l.var()] = SparseVec::new(self.matrix_width);
            }
            pq.push((self.effective_count(f_pos), Reverse(f_pos)));
            pq.push((self.effective_count(f_neg), Reverse(f_neg)));
            pq.push((self.effective_count(var), Reverse(var)));

            self.num_replacements += 1;
        }
        info!("queue drained after {} replacements", self.num_replacements);
    }

    /// Write the formula in DIMACS, returning `(vars, live clauses)`.
    pub fn to_cnf<W: Write>(&self, out: &mut W) -> io::Result<(u32, usize)> {
        let live = self.num_live_clauses();
        writeln!(out, "p cnf {} {}", self.num_vars, live)?;
        for cls in &self.clauses {
            if cls.deleted {
                continue;
            }
            for l in &cls.lits {
                write!(out, "{} ", l.to_dimacs())?;
            }
            writeln!(out, "0")?;
        }
        Ok((self.num_vars, live))
    }

    /// The formula as a flat 0-terminated buffer, plus `(vars, live clauses)`.
    pub fn get_cnf(&self) -> (Vec<i32>, u32, usize) {
        let mut buf = Vec::new();
        for cls in &self.clauses {
            if cls.deleted {
                continue;
            }
            buf.extend(cls.lits.iter().map(|l| l.to_dimacs()));
            buf.push(0);
        }
        (buf, self.num_vars, self.num_live_clauses())
    }

    /// Write the recorded DRAT trail.
    pub fn to_proof<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self.proof)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn formula(num_vars: u32, clauses: &[&[i32]], opts: Config) -> Formula {
        let mut f = Formula::new(opts);
        f.init_cnf(num_vars);
        for c in clauses {
            f.add_cl(c);
        }
        f.finish_cnf();
        f
    }

    #[test]
    fn test_effective_count_tracks_tombstones() {
        let f = formula(
            3,
            &[&[1, 2], &[1, 3], &[2, 1], &[-1, 3]],
            Config::default(),
        );
        // clause 2 is a duplicate of clause 0 and is tombstoned at ingest
        assert_eq!(f.num_clauses(), 4);
        assert_eq!(f.num_live_clauses(), 3);
        assert_eq!(f.effective_count(Lit::from_dimacs(1)), 2);
        assert_eq!(f.effective_count(Lit::from_dimacs(-1)), 1);
        assert_eq!(f.effective_count(Lit::from_dimacs(3)), 2);
        assert_eq!(f.effective_count(Lit::from_dimacs(-3)), 0);
    }

    #[test]
    fn test_clause_diff_bounded() {
        let a: Vec<Lit> = [1, 3, 5].iter().map(|&l| Lit::from_dimacs(l)).collect();
        let b: Vec<Lit> = [1, 4, 5].iter().map(|&l| Lit::from_dimacs(l)).collect();
        let mut diff = Vec::new();
        clause_diff(&a, &b, &mut diff, 2);
        assert_eq!(diff, vec![Lit::from_dimacs(3)]);
        clause_diff(&b, &a, &mut diff, 2);
        assert_eq!(diff, vec![Lit::from_dimacs(4)]);

        let c: Vec<Lit> = [-6, 2].iter().map(|&l| Lit::from_dimacs(l)).collect();
        clause_diff(&a, &c, &mut diff, 2);
        assert_eq!(diff.len(), 3); // capped at max_diff + 1
    }

    #[test]
    fn test_reduction_metric() {
        assert_eq!(reduction(1, 2), -1);
        assert_eq!(reduction(2, 2), 0);
        assert_eq!(reduction(2, 3), 1);
        assert_eq!(reduction(3, 3), 3);
    }

    #[test]
    fn test_adjacency_counts_co_occurrences() {
        let mut f = formula(3, &[&[1, 2], &[-1, 2, 3], &[1, -3]], Config::default());
        f.update_adjacency(Var::from_dimacs(1));
        let row = &f.matrix[Var::from_dimacs(1)];
        // var 1 occurs in all three clauses: 3 self, 2 with var 2, 2 with var 3
        assert_eq!(row.get(0), 3);
        assert_eq!(row.get(1), 2);
        assert_eq!(row.get(2), 2);
    }

    #[test]
    fn test_run_on_empty_formula() {
        let mut f = formula(0, &[], Config::default());
        f.run(Tiebreak::ThreeHop);
        assert_eq!(f.num_replacements(), 0);
        assert_eq!(f.num_clauses(), 0);
    }
}
