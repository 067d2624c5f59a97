use crate::context::BixContext;
use crate::error::{BixError, BixGenericError, BixResult};
use crate::index::{IndexKey, Partition};
use crate::name::BixName;
use crate::query::{QueryNode, QueryRegex, RegexExpander, SliceValue};
use crate::slice::{IndexSlice, SetOp};


/// a regex the planner ran into, kept for introspection; does not alter
/// the result
#[derive(Debug, Clone)]
pub struct RegexNode {
    pub field: BixName,
    pub invert: bool,
    pub regex: QueryRegex,
}

/// recursive evaluator that reduces a predicate tree to a single slice
///
/// deliberately naive: the tree shape is preserved, the only rewrite is
/// flattening a slice node's range/regex children into one range union
pub struct QueryPlanner<'a> {
    invert: bool,
    partition: Partition,
    bucket: BixName,
    context: &'a mut BixContext,
    expander: &'a dyn RegexExpander,
    status: Option<BixGenericError>,
    regexes: Vec<RegexNode>,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(
        partition: Partition,
        bucket: BixName,
        context: &'a mut BixContext,
        expander: &'a dyn RegexExpander,
    ) -> Self {
        Self {
            invert: false,
            partition,
            bucket,
            context,
            expander,
            status: None,
            regexes: vec![],
        }
    }

    /// reduce `node` to a single slice, failing with the first error any
    /// step produced
    pub fn evaluate(mut self, node: &QueryNode) -> BixResult<IndexSlice> {
        debug!("QueryPlanner::evaluate(partition: {}, bucket: {})", self.partition, self.bucket);
        let slice = self.apply(node);
        match self.status {
            Some(err) => Err(err),
            None => Ok(slice),
        }
    }

    /// recursively reduce `node`; after an error the partial result built so
    /// far is still returned and [Self::status] reports the failure
    pub fn apply(&mut self, node: &QueryNode) -> IndexSlice {
        match node {
            QueryNode::Or(children) => self.fold(children, SetOp::Union, false),
            QueryNode::Xor(children) => self.fold(children, SetOp::SymmetricDifference, false),
            QueryNode::And(children) => self.fold(children, SetOp::Intersection, true),
            QueryNode::Not(child) => {
                // push a not onto the stack for anyone inspecting the traversal
                self.invert = !self.invert;
                let mut slice = self.apply(child);
                slice.invert();
                self.invert = !self.invert;
                slice
            }
            QueryNode::Group(..) => {
                self.record(Err(anyhow!(BixError::IndexOperation(
                    "`group` query nodes are reserved".to_owned(),
                ))));
                IndexSlice::default()
            }
            QueryNode::Slice { field, values } => self.apply_slice(*field, values),
        }
    }

    pub fn status(&self) -> Option<&BixGenericError> {
        self.status.as_ref()
    }

    /// the regexes encountered so far, in traversal order
    pub fn regexes(&self) -> &[RegexNode] {
        &self.regexes
    }

    /// left-to-right fold over `children`
    ///
    /// a `seeded` fold takes the first child as the initial value, which is
    /// how intersection avoids annihilating against the empty accumulator
    fn fold(&mut self, children: &[QueryNode], op: SetOp, seeded: bool) -> IndexSlice {
        let mut result = IndexSlice::default();
        for (i, child) in children.iter().enumerate() {
            if !self.ok() {
                break;
            }
            let temp = self.apply(child);
            if seeded && i == 0 {
                result = temp;
            } else {
                result.apply(op, &temp);
            }
        }
        result
    }

    fn apply_slice(&mut self, field: BixName, values: &[SliceValue]) -> IndexSlice {
        let mut result = IndexSlice::default();
        if !self.ok() {
            return result;
        }

        let key = IndexKey::new(self.partition, self.bucket, field);
        let index = match self.context.get_index(key) {
            Ok(index) => index,
            Err(err) => {
                self.record(Err(err));
                return result;
            }
        };

        if values.is_empty() {
            index.slice_all(&mut result);
            return result;
        }

        let mut ranges = vec![];
        for value in values {
            match value {
                SliceValue::Range(range) => ranges.push(*range),
                SliceValue::Regex(regex) => {
                    // borrow of `index` is still live, so record inline
                    if let Err(err) = self.expander.to_ranges(regex, &mut ranges) {
                        if self.status.is_none() {
                            self.status = Some(err);
                        }
                        break;
                    }
                    self.regexes.push(RegexNode {
                        field,
                        invert: self.invert,
                        regex: regex.clone(),
                    });
                }
            }
        }

        if self.status.is_none() {
            let status = index.slice_ranges(&ranges, SetOp::Union, &mut result);
            self.record(status);
        }
        result
    }

    /// keep the first error; evaluation short-circuits on it
    fn record(&mut self, status: BixResult<()>) {
        if let Err(err) = status {
            if self.status.is_none() {
                self.status = Some(err);
            }
        }
    }

    fn ok(&self) -> bool {
        self.status.is_none()
    }
}
