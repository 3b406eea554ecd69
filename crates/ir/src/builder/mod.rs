mod func_builder;
mod module_builder;

pub use func_builder::FunctionBuilder;
pub use module_builder::ModuleBuilder;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error("duplicate global symbol `{0}`")]
    DuplicateGlobal(String),

    #[error("function `{0}` already has a body")]
    AlreadyDefined(String),
}

pub mod test_util {
    use super::*;

    use crate::{
        Linkage, Signature, Type,
        module::{Module, ModuleCtx},
    };

    /// Builds a module holding a single function named `test_func`.
    #[derive(Default)]
    pub struct TestModuleBuilder {
        module_builder: ModuleBuilder,
    }

    impl TestModuleBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_ctx(ctx: ModuleCtx) -> Self {
            Self {
                module_builder: ModuleBuilder::new(ctx),
            }
        }

        pub fn module_builder(&mut self) -> &mut ModuleBuilder {
            &mut self.module_builder
        }

        pub fn func_builder(&mut self, args: &[Type], ret_ty: Type) -> FunctionBuilder<'_> {
            let sig = Signature::new("test_func", Linkage::Public, args, ret_ty);
            let func_ref = self.module_builder.declare_function(sig);
            self.module_builder.func_builder(func_ref)
        }

        pub fn build(self) -> Module {
            self.module_builder.build()
        }
    }
}
