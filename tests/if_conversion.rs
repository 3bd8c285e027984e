//! End-to-end tests of the if-conversion pass over small flowgraphs.
//!
//! Beyond checking shapes, these tests prove behaviour preservation: each
//! converted function is interpreted before and after the pass over a range
//! of inputs and the observable results must match.

use ifcvt::prelude::*;

mod helpers {
    use super::*;
    use std::collections::HashMap;

    /// Evaluates an expression tree over the given local environment.
    /// Arithmetic is width-aware: `Int`-typed nodes wrap at 32 bits.
    pub fn eval_expr(g: &FlowGraph, e: ExprId, env: &HashMap<LocalId, i64>) -> i64 {
        let node = g.expr(e);
        let wide = !matches!(node.ty, ValType::Int);
        match node.kind {
            ExprKind::IntConst { value } => value,
            ExprKind::LocalRead { local } => *env.get(&local).unwrap_or(&0),
            ExprKind::Compare { op, lhs, rhs } => {
                let l = eval_expr(g, lhs, env);
                let r = eval_expr(g, rhs, env);
                let hit = match op {
                    CompareOp::Eq => l == r,
                    CompareOp::Ne => l != r,
                    CompareOp::Lt => l < r,
                    CompareOp::Le => l <= r,
                    CompareOp::Gt => l > r,
                    CompareOp::Ge => l >= r,
                };
                i64::from(hit)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = eval_expr(g, lhs, env);
                let r = eval_expr(g, rhs, env);
                let v = match op {
                    BinaryOp::Add => l.wrapping_add(r),
                    BinaryOp::Sub => l.wrapping_sub(r),
                    BinaryOp::And => l & r,
                    BinaryOp::Or => l | r,
                    BinaryOp::Xor => l ^ r,
                    BinaryOp::Shl => l.wrapping_shl(r as u32),
                    BinaryOp::Shr => l.wrapping_shr(r as u32),
                    BinaryOp::Shru => {
                        if wide {
                            ((l as u64).wrapping_shr(r as u32)) as i64
                        } else {
                            i64::from((l as u32).wrapping_shr(r as u32))
                        }
                    }
                };
                if wide {
                    v
                } else {
                    i64::from(v as i32)
                }
            }
            ExprKind::Select {
                cond,
                when_true,
                when_false,
            } => {
                if eval_expr(g, cond, env) != 0 {
                    eval_expr(g, when_true, env)
                } else {
                    eval_expr(g, when_false, env)
                }
            }
            ExprKind::Phi | ExprKind::Other => panic!("opaque expression in an interpreted test"),
        }
    }

    /// Interprets the function from its first block and returns the value of
    /// the first return statement reached.
    pub fn run_function(g: &FlowGraph, env: &mut HashMap<LocalId, i64>) -> Option<i64> {
        let mut block = g.block_ids().next().expect("empty function");
        for _ in 0..1024 {
            let mut taken = false;
            for &stmt in g.block(block).statements() {
                match g.stmt(stmt).kind {
                    StmtKind::StoreLocal { local, value } => {
                        let v = eval_expr(g, value, env);
                        env.insert(local, v);
                    }
                    StmtKind::Return { value } => {
                        return value.map(|v| eval_expr(g, v, env));
                    }
                    StmtKind::JumpIfTrue { cond } => taken = eval_expr(g, cond, env) != 0,
                    StmtKind::Nop => {}
                    StmtKind::Other => panic!("opaque statement in an interpreted test"),
                }
            }
            block = match g.block(block).kind {
                BlockKind::Cond => {
                    if taken {
                        g.true_target(block).expect("cond block without true edge")
                    } else {
                        g.false_target(block).expect("cond block without false edge")
                    }
                }
                _ => match g.unique_succ(block) {
                    Some(next) => next,
                    None => return None,
                },
            };
        }
        panic!("interpreter did not terminate");
    }

    /// Asserts that two graphs compute the same result for every `x` in a
    /// range around the branch pivot, with `a` preset to a sentinel.
    pub fn assert_equivalent(before: &FlowGraph, after: &FlowGraph, x: LocalId, a: LocalId) {
        for v in -20..20 {
            let mut env1 = HashMap::from([(x, v), (a, 1000)]);
            let mut env2 = HashMap::from([(x, v), (a, 1000)]);
            let r1 = run_function(before, &mut env1);
            let r2 = run_function(after, &mut env2);
            assert_eq!(r1, r2, "results diverge at x = {v}");
            assert_eq!(env1.get(&a), env2.get(&a), "stored local diverges at x = {v}");
        }
    }

    pub struct Diamond {
        pub graph: FlowGraph,
        pub x: LocalId,
        pub a: LocalId,
        pub start: BlockId,
    }

    /// `if (x < 7) { a = then_val; } return a;`
    /// The branch tests the reversed condition and jumps over the arm.
    pub fn half_diamond(then_val: i64) -> Diamond {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Int, true);
        let a = b.local(ValType::Int, true);
        let start = b.cond_block();
        let then = b.jump_block();
        let merge = b.return_block();
        let xr = b.local_read(x);
        let seven = b.int_const(7, ValType::Int);
        let cond = b.compare(CompareOp::Ge, xr, seven);
        b.jump_if_true(start, cond);
        let v = b.int_const(then_val, ValType::Int);
        b.store(then, a, v);
        let ar = b.local_read(a);
        b.ret(merge, Some(ar));
        b.branch_to(start, merge, then, 0.5);
        b.jump_to(then, merge);
        Diamond {
            graph: b.finish(),
            x,
            a,
            start,
        }
    }

    /// `if (x < 7) { a = then_val; } else { a = else_val; } return a;`
    pub fn full_diamond(then_val: i64, else_val: i64) -> Diamond {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Int, true);
        let a = b.local(ValType::Int, true);
        let start = b.cond_block();
        let then = b.jump_block();
        let els = b.jump_block();
        let merge = b.return_block();
        let xr = b.local_read(x);
        let seven = b.int_const(7, ValType::Int);
        let cond = b.compare(CompareOp::Ge, xr, seven);
        b.jump_if_true(start, cond);
        let tv = b.int_const(then_val, ValType::Int);
        b.store(then, a, tv);
        let ev = b.int_const(else_val, ValType::Int);
        b.store(els, a, ev);
        let ar = b.local_read(a);
        b.ret(merge, Some(ar));
        b.branch_to(start, els, then, 0.5);
        b.jump_to(then, merge);
        b.jump_to(els, merge);
        Diamond {
            graph: b.finish(),
            x,
            a,
            start,
        }
    }

    /// `return (x < 7) ? then_val : else_val;` as two returning arms.
    pub fn return_diamond(then_val: i64, else_val: i64) -> Diamond {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Int, true);
        let a = b.local(ValType::Int, true);
        let start = b.cond_block();
        let then = b.return_block();
        let els = b.return_block();
        let xr = b.local_read(x);
        let seven = b.int_const(7, ValType::Int);
        let cond = b.compare(CompareOp::Ge, xr, seven);
        b.jump_if_true(start, cond);
        let tv = b.int_const(then_val, ValType::Int);
        b.ret(then, Some(tv));
        let ev = b.int_const(else_val, ValType::Int);
        b.ret(els, Some(ev));
        b.branch_to(start, els, then, 0.5);
        Diamond {
            graph: b.finish(),
            x,
            a,
            start,
        }
    }

    pub fn ctx() -> PassContext {
        PassContext::new(PassConfig::default(), Target::default())
    }
}

use helpers::*;

#[test]
fn half_diamond_store_becomes_select() {
    let d = half_diamond(5);
    let before = d.graph.clone();
    let mut graph = d.graph;
    let ctx = ctx();

    let status = IfConversionPass::new().run(&mut graph, &ctx).unwrap();
    assert!(status.modified());
    graph.validate().unwrap();

    // The head is straight-line now.
    assert_eq!(graph.block(d.start).kind, BlockKind::Jump);
    assert_eq!(graph.block(d.start).out_edges().len(), 1);
    assert_eq!(graph.block(d.start).out_edges()[0].kind, EdgeKind::Always);

    assert_equivalent(&before, &graph, d.x, d.a);
    assert_eq!(ctx.events.count(EventKind::BranchConverted), 1);
}

#[test]
fn full_diamond_store_becomes_select() {
    let d = full_diamond(5, 9);
    let before = d.graph.clone();
    let mut graph = d.graph;
    let ctx = ctx();

    assert!(IfConversionPass::new().run(&mut graph, &ctx).unwrap().modified());
    graph.validate().unwrap();

    // Exactly one select, with the else value on the branch-taken side.
    let select = graph
        .block(d.start)
        .statements()
        .iter()
        .find_map(|&s| match graph.stmt(s).kind {
            StmtKind::StoreLocal { value, .. } => match graph.expr(value).kind {
                ExprKind::Select {
                    when_true,
                    when_false,
                    ..
                } => Some((when_true, when_false)),
                _ => None,
            },
            _ => None,
        })
        .expect("no select store on the head");
    assert_eq!(graph.expr(select.0).int_const(), Some(9));
    assert_eq!(graph.expr(select.1).int_const(), Some(5));

    assert_equivalent(&before, &graph, d.x, d.a);
}

#[test]
fn return_diamond_becomes_select_return() {
    let d = return_diamond(5, 9);
    let before = d.graph.clone();
    let mut graph = d.graph;
    let ctx = ctx();

    assert!(IfConversionPass::new().run(&mut graph, &ctx).unwrap().modified());

    // The head now carries a return of a select.
    let returns_select = graph
        .block(d.start)
        .statements()
        .iter()
        .any(|&s| match graph.stmt(s).kind {
            StmtKind::Return { value: Some(v) } => {
                matches!(graph.expr(v).kind, ExprKind::Select { .. })
            }
            _ => false,
        });
    assert!(returns_select);

    assert_equivalent(&before, &graph, d.x, d.a);
}

#[test]
fn bool_store_collapses_to_the_condition() {
    // if (x < 7) a = 0; else a = 1;  -->  a = (x >= 7), no select needed.
    let d = full_diamond(0, 1);
    let before = d.graph.clone();
    let mut graph = d.graph;
    let ctx = ctx();

    assert!(IfConversionPass::new().run(&mut graph, &ctx).unwrap().modified());
    assert_eq!(ctx.events.count(EventKind::PeepholeApplied), 1);

    let stored_compare = graph
        .block(d.start)
        .statements()
        .iter()
        .any(|&s| match graph.stmt(s).kind {
            StmtKind::StoreLocal { value, .. } => {
                matches!(graph.expr(value).kind, ExprKind::Compare { .. })
            }
            _ => false,
        });
    assert!(stored_compare);

    assert_equivalent(&before, &graph, d.x, d.a);
}

#[test]
fn const_pair_lowers_to_arithmetic_without_cmov() {
    // (x < 7) ? 5 : 6 on a target without a conditional move: 5 + cond.
    let d = full_diamond(5, 6);
    let before = d.graph.clone();
    let mut graph = d.graph;
    let ctx = PassContext::new(PassConfig::default(), Target::ordinary_ops());

    assert!(IfConversionPass::new().run(&mut graph, &ctx).unwrap().modified());
    assert_eq!(ctx.events.count(EventKind::PeepholeApplied), 1);

    let stored_binary = graph
        .block(d.start)
        .statements()
        .iter()
        .any(|&s| match graph.stmt(s).kind {
            StmtKind::StoreLocal { value, .. } => {
                matches!(graph.expr(value).kind, ExprKind::Binary { .. })
            }
            _ => false,
        });
    assert!(stored_binary);

    assert_equivalent(&before, &graph, d.x, d.a);
}

#[test]
fn unrewritable_select_is_vetoed_without_cmov() {
    // 17 and 3 fit no identity; without a conditional move the candidate
    // must be abandoned with the function untouched.
    let d = full_diamond(17, 3);
    let mut graph = d.graph;
    let ctx = PassContext::new(PassConfig::default(), Target::ordinary_ops());

    let status = IfConversionPass::new().run(&mut graph, &ctx).unwrap();
    assert!(!status.modified());
    assert_eq!(ctx.events.count(EventKind::LoweringVetoed), 1);

    // Zero-mutation abandonment: the branch and both stores are still there.
    graph.validate().unwrap();
    assert_eq!(graph.block(d.start).kind, BlockKind::Cond);
    let branch = graph.block(d.start).last_statement().unwrap();
    assert!(matches!(graph.stmt(branch).kind, StmtKind::JumpIfTrue { .. }));
}

#[test]
fn arm_chain_length_is_bounded() {
    // A then arm of five empty blocks plus the store: default limit rejects,
    // a raised limit converts.
    fn build() -> (FlowGraph, LocalId, LocalId) {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Int, true);
        let a = b.local(ValType::Int, true);
        let start = b.cond_block();
        let chain: Vec<_> = (0..5).map(|_| b.jump_block()).collect();
        let merge = b.return_block();
        let xr = b.local_read(x);
        let seven = b.int_const(7, ValType::Int);
        let cond = b.compare(CompareOp::Ge, xr, seven);
        b.jump_if_true(start, cond);
        let five = b.int_const(5, ValType::Int);
        b.store(chain[0], a, five);
        let ar = b.local_read(a);
        b.ret(merge, Some(ar));
        b.branch_to(start, merge, chain[0], 0.5);
        for w in chain.windows(2) {
            b.jump_to(w[0], w[1]);
        }
        b.jump_to(chain[4], merge);
        (b.finish(), x, a)
    }

    let (mut graph, _, _) = build();
    let ctx = ctx();
    assert!(!IfConversionPass::new().run(&mut graph, &ctx).unwrap().modified());

    let (mut graph, x, a) = build();
    let before = graph.clone();
    let relaxed = PassContext::new(
        PassConfig::default().with_chain_limit(5),
        Target::default(),
    );
    assert!(IfConversionPass::new().run(&mut graph, &relaxed).unwrap().modified());
    assert_equivalent(&before, &graph, x, a);
}

#[test]
fn effectful_store_value_is_rejected() {
    let mut d = half_diamond(5);
    // Taint the stored constant as effectful, e.g. an interlocked source.
    let store_value = d
        .graph
        .block_ids()
        .flat_map(|id| d.graph.block(id).statements().to_vec())
        .find_map(|s| match d.graph.stmt(s).kind {
            StmtKind::StoreLocal { value, .. } => Some(value),
            _ => None,
        })
        .unwrap();
    d.graph.expr_mut(store_value).flags |= EffectFlags::SIDE_EFFECT;

    let mut graph = d.graph;
    assert!(!IfConversionPass::new().run(&mut graph, &ctx()).unwrap().modified());
}

#[test]
fn ordering_sensitive_condition_limits_store_values() {
    // A condition that must not be reordered (a volatile load operand, say)
    // only tolerates constant or bare-local stored values.
    fn build(composite_value: bool) -> FlowGraph {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Int, true);
        let a = b.local(ValType::Int, true);
        let start = b.cond_block();
        let then = b.jump_block();
        let merge = b.return_block();
        let xr = b.local_read(x);
        let seven = b.int_const(7, ValType::Int);
        let cond = b.compare(CompareOp::Ge, xr, seven);
        b.flag(cond, EffectFlags::ORDER_SIDE_EFFECT);
        b.jump_if_true(start, cond);
        let value = if composite_value {
            let one = b.int_const(1, ValType::Int);
            let two = b.int_const(2, ValType::Int);
            b.binary(BinaryOp::Add, ValType::Int, one, two)
        } else {
            b.int_const(3, ValType::Int)
        };
        b.store(then, a, value);
        let ar = b.local_read(a);
        b.ret(merge, Some(ar));
        b.branch_to(start, merge, then, 0.5);
        b.jump_to(then, merge);
        b.finish()
    }

    let mut composite = build(true);
    assert!(!IfConversionPass::new().run(&mut composite, &ctx()).unwrap().modified());

    let mut constant = build(false);
    assert!(IfConversionPass::new().run(&mut constant, &ctx()).unwrap().modified());
}

#[test]
fn wide_stores_need_a_wide_target() {
    fn build() -> FlowGraph {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Long, true);
        let a = b.local(ValType::Long, true);
        let start = b.cond_block();
        let then = b.jump_block();
        let merge = b.return_block();
        let xr = b.local_read(x);
        let seven = b.int_const(7, ValType::Long);
        let cond = b.compare(CompareOp::Ge, xr, seven);
        b.jump_if_true(start, cond);
        let five = b.int_const(5, ValType::Long);
        b.store(then, a, five);
        let ar = b.local_read(a);
        b.ret(merge, Some(ar));
        b.branch_to(start, merge, then, 0.5);
        b.jump_to(then, merge);
        b.finish()
    }

    let narrow = PassContext::new(
        PassConfig::default(),
        Target {
            word_width: WordWidth::Bits32,
            select_lowering: SelectLowering::Native,
        },
    );
    let mut graph = build();
    assert!(!IfConversionPass::new().run(&mut graph, &narrow).unwrap().modified());

    let mut graph = build();
    assert!(IfConversionPass::new().run(&mut graph, &ctx()).unwrap().modified());
}

#[test]
fn cost_gate_rejects_expensive_arms() {
    // Chained adds give odd node counts: 3 adds is cost 7, 4 adds is cost 9.
    fn build(adds: usize) -> FlowGraph {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Int, true);
        let a = b.local(ValType::Int, true);
        let start = b.cond_block();
        let then = b.jump_block();
        let merge = b.return_block();
        let xr = b.local_read(x);
        let seven = b.int_const(7, ValType::Int);
        let cond = b.compare(CompareOp::Ge, xr, seven);
        b.jump_if_true(start, cond);
        let mut value = b.int_const(1, ValType::Int);
        for i in 0..adds {
            let c = b.int_const(i as i64, ValType::Int);
            value = b.binary(BinaryOp::Add, ValType::Int, value, c);
        }
        b.store(then, a, value);
        let ar = b.local_read(a);
        b.ret(merge, Some(ar));
        b.branch_to(start, merge, then, 0.5);
        b.jump_to(then, merge);
        b.finish()
    }

    // Cost exactly at the threshold converts.
    let mut graph = build(3);
    assert!(IfConversionPass::new().run(&mut graph, &ctx()).unwrap().modified());

    // One more node crosses it.
    let mut graph = build(4);
    let ctx = ctx();
    assert!(!IfConversionPass::new().run(&mut graph, &ctx).unwrap().modified());
    assert_eq!(ctx.events.count(EventKind::CostVetoed), 1);

    // The stress toggle forces it through.
    let mut graph = build(4);
    let forced = PassContext::new(
        PassConfig::default().with_stress_skip_cost_veto(),
        Target::default(),
    );
    assert!(IfConversionPass::new().run(&mut graph, &forced).unwrap().modified());
}

#[test]
fn spill_penalty_counts_against_the_threshold() {
    // The same value costs two more when the destination is unlikely to be
    // register-allocated: cost 5 + 2 passes, cost 7 + 2 does not.
    fn build(adds: usize) -> FlowGraph {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Int, true);
        let a = b.local(ValType::Int, false);
        let start = b.cond_block();
        let then = b.jump_block();
        let merge = b.return_block();
        let xr = b.local_read(x);
        let seven = b.int_const(7, ValType::Int);
        let cond = b.compare(CompareOp::Ge, xr, seven);
        b.jump_if_true(start, cond);
        let mut value = b.int_const(1, ValType::Int);
        for i in 0..adds {
            let c = b.int_const(i as i64, ValType::Int);
            value = b.binary(BinaryOp::Add, ValType::Int, value, c);
        }
        b.store(then, a, value);
        let ar = b.local_read(a);
        b.ret(merge, Some(ar));
        b.branch_to(start, merge, then, 0.5);
        b.jump_to(then, merge);
        b.finish()
    }

    let mut graph = build(2);
    assert!(IfConversionPass::new().run(&mut graph, &ctx()).unwrap().modified());

    let mut graph = build(3);
    assert!(!IfConversionPass::new().run(&mut graph, &ctx()).unwrap().modified());
}

#[test]
fn loop_resident_heads_are_skipped() {
    let d = half_diamond(5);
    let mut graph = d.graph;
    graph.block_mut(d.start).weight = UNITY_WEIGHT * 2.0;

    let ctx = ctx();
    assert!(!IfConversionPass::new().run(&mut graph, &ctx).unwrap().modified());
    assert_eq!(ctx.events.count(EventKind::LoopVetoed), 1);

    let forced = PassContext::new(
        PassConfig::default().with_stress_skip_loop_veto(),
        Target::default(),
    );
    assert!(IfConversionPass::new().run(&mut graph, &forced).unwrap().modified());
}

#[test]
fn disabled_pass_reports_no_change() {
    let d = half_diamond(5);
    let mut graph = d.graph;
    let ctx = PassContext::new(PassConfig::disabled(), Target::default());
    let status = IfConversionPass::new().run(&mut graph, &ctx).unwrap();
    assert_eq!(status, PhaseStatus::ModifiedNothing);
    assert_eq!(graph.block(d.start).kind, BlockKind::Cond);
}

#[test]
fn ssa_form_input_is_rejected() {
    let d = half_diamond(5);
    let mut graph = d.graph;
    graph.mark_ssa_form(true);
    let result = IfConversionPass::new().run(&mut graph, &ctx());
    assert!(matches!(result, Err(Error::SsaFormInput)));
}

#[test]
fn independent_diamonds_convert_in_one_run() {
    // Two half diamonds back to back; reverse iteration must convert both.
    let mut b = FunctionBuilder::new();
    let x = b.local(ValType::Int, true);
    let a = b.local(ValType::Int, true);
    let c = b.local(ValType::Int, true);
    let start1 = b.cond_block();
    let then1 = b.jump_block();
    let start2 = b.cond_block();
    let then2 = b.jump_block();
    let merge = b.return_block();

    let xr = b.local_read(x);
    let seven = b.int_const(7, ValType::Int);
    let cond1 = b.compare(CompareOp::Ge, xr, seven);
    b.jump_if_true(start1, cond1);
    let five = b.int_const(5, ValType::Int);
    b.store(then1, a, five);

    let xr2 = b.local_read(x);
    let zero = b.int_const(0, ValType::Int);
    let cond2 = b.compare(CompareOp::Lt, xr2, zero);
    b.jump_if_true(start2, cond2);
    let nine = b.int_const(9, ValType::Int);
    b.store(then2, c, nine);

    let ar = b.local_read(a);
    b.ret(merge, Some(ar));

    b.branch_to(start1, start2, then1, 0.5);
    b.jump_to(then1, start2);
    b.branch_to(start2, merge, then2, 0.5);
    b.jump_to(then2, merge);
    let mut graph = b.finish();
    let before = graph.clone();

    let ctx = ctx();
    assert!(IfConversionPass::new().run(&mut graph, &ctx).unwrap().modified());
    assert_eq!(ctx.events.count(EventKind::BranchConverted), 2);
    assert_equivalent(&before, &graph, x, a);
}

#[test]
fn parallel_driver_counts_modified_functions() {
    let mut graphs = vec![
        half_diamond(5).graph,
        full_diamond(5, 9).graph,
        return_diamond(1, 2).graph,
    ];
    // One function with nothing to convert.
    let mut b = FunctionBuilder::new();
    let r = b.return_block();
    b.ret(r, None);
    graphs.push(b.finish());

    let ctx = ctx();
    let modified = IfConversionPass::new()
        .run_over_functions(&mut graphs, &ctx)
        .unwrap();
    assert_eq!(modified, 3);
    assert_eq!(ctx.events.count(EventKind::BranchConverted), 3);
}

#[test]
fn conversion_events_name_the_head_block() {
    let d = half_diamond(5);
    let mut graph = d.graph;
    let ctx = ctx();
    IfConversionPass::new().run(&mut graph, &ctx).unwrap();

    let events = ctx.events.snapshot();
    let converted = events
        .iter()
        .find(|e| e.kind == EventKind::BranchConverted)
        .unwrap();
    assert_eq!(converted.block, Some(d.start));
    assert!(converted.message.contains(&d.start.to_string()));
}
