//! Textual form of the IR.
//!
//! The same text is used for listings and for the instruction excerpts that
//! diagnostics quote.
use std::io;

use crate::{Function, Module, module::FuncRef, module::ModuleCtx};

pub trait IrWrite<Ctx> {
    fn write<W>(&self, w: &mut W, ctx: &Ctx) -> io::Result<()>
    where
        W: io::Write;

    fn dump_string(&self, ctx: &Ctx) -> String {
        let mut s = Vec::new();
        // Writing into a `Vec` never fails.
        let _ = self.write(&mut s, ctx);
        String::from_utf8_lossy(&s).into_owned()
    }
}

impl<T, Ctx> IrWrite<Ctx> for [T]
where
    T: IrWrite<Ctx>,
{
    fn write<W>(&self, w: &mut W, ctx: &Ctx) -> io::Result<()>
    where
        W: io::Write,
    {
        let mut iter = self.iter().peekable();
        while let Some(item) = iter.next() {
            item.write(w, ctx)?;
            if iter.peek().is_some() {
                write!(w, ", ")?;
            }
        }
        Ok(())
    }
}

/// Context needed to write anything that lives inside a function body.
#[derive(Clone, Copy)]
pub struct FuncWriteCtx<'a> {
    pub module: &'a ModuleCtx,
    pub func: &'a Function,
}

impl<'a> FuncWriteCtx<'a> {
    pub fn new(module: &'a ModuleCtx, func: &'a Function) -> Self {
        Self { module, func }
    }
}

impl AsRef<ModuleCtx> for FuncWriteCtx<'_> {
    fn as_ref(&self) -> &ModuleCtx {
        self.module
    }
}

pub struct ModuleWriter<'a> {
    module: &'a Module,
}

impl<'a> ModuleWriter<'a> {
    pub fn new(module: &'a Module) -> Self {
        Self { module }
    }

    pub fn write(&self, mut w: impl io::Write) -> io::Result<()> {
        let ctx = &self.module.ctx;
        writeln!(w, "target = {}", ctx.data_layout)?;

        for s in ctx.types().all_struct_data() {
            s.write(&mut w, ctx)?;
            writeln!(w)?;
        }

        for gv in ctx.all_gv_data() {
            gv.write(&mut w, ctx)?;
            writeln!(w)?;
        }

        for (func_ref, sig) in ctx.iter_func_sigs() {
            if let Some(func) = self.module.funcs.get(&func_ref)
                && !func.is_declaration()
            {
                writeln!(w)?;
                FuncWriter::new(ctx, func_ref, func).write(&mut w)?;
            } else {
                writeln!(w, "declare {}", sig.dump_string(ctx))?;
            }
        }

        Ok(())
    }

    pub fn dump_string(&self) -> String {
        let mut s = Vec::new();
        let _ = self.write(&mut s);
        String::from_utf8_lossy(&s).into_owned()
    }
}

pub struct FuncWriter<'a> {
    ctx: FuncWriteCtx<'a>,
    func_ref: FuncRef,
}

impl<'a> FuncWriter<'a> {
    pub fn new(module: &'a ModuleCtx, func_ref: FuncRef, func: &'a Function) -> Self {
        Self {
            ctx: FuncWriteCtx::new(module, func),
            func_ref,
        }
    }

    pub fn write(&self, mut w: impl io::Write) -> io::Result<()> {
        let sig = self.ctx.module.func_sig(self.func_ref);
        write!(w, "func {} %{}(", sig.linkage(), sig.name())?;
        let mut args = self.ctx.func.arg_values.iter().peekable();
        while let Some(arg) = args.next() {
            arg.write(&mut w, &self.ctx)?;
            write!(w, ".")?;
            self.ctx.func.dfg.value_ty(*arg).write(&mut w, &self.ctx)?;
            if args.peek().is_some() {
                write!(w, ", ")?;
            }
        }
        write!(w, ") -> ")?;
        sig.ret_ty().write(&mut w, &self.ctx)?;
        writeln!(w, " {{")?;

        let layout = &self.ctx.func.layout;
        for block in layout.iter_block() {
            writeln!(w, "    {block}:")?;
            for inst in layout.iter_inst(block) {
                write!(w, "        ")?;
                inst.write(&mut w, &self.ctx)?;
                writeln!(w)?;
            }
        }

        writeln!(w, "}}")
    }

    pub fn dump_string(&self) -> String {
        let mut s = Vec::new();
        let _ = self.write(&mut s);
        String::from_utf8_lossy(&s).into_owned()
    }
}
