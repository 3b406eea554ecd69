pub mod builder;
pub mod data_layout;
pub mod dfg;
pub mod function;
pub mod global_variable;
pub mod inst;
pub mod intrinsic;
pub mod ir_writer;
pub mod layout;
pub mod linkage;
pub mod metadata;
pub mod module;
pub mod types;
pub mod value;

pub use builder::{BuilderError, FunctionBuilder, ModuleBuilder};
pub use data_layout::DataLayout;
pub use dfg::{Block, BlockId, DataFlowGraph};
pub use function::{Function, Signature};
pub use global_variable::{GlobalVariable, GlobalVariableData, GlobalVariableStore};
pub use inst::{
    ArithFlags, CallAttr, CallAttrs, CallConv, InstData, InstDetail, InstId, MemAccess, Opcode,
};
pub use intrinsic::IntrinsicId;
pub use layout::Layout;
pub use linkage::Linkage;
pub use metadata::{MdKind, MdNode, MetadataKinds};
pub use module::{FuncRef, Module, ModuleCtx};
pub use types::{CompoundType, CompoundTypeRef, Type, TypeStore};
pub use value::{ConstExpr, GlobalRef, Immediate, Value, ValueId};
