use std::any::Any;
use std::error::Error as _;
use std::rc::Rc;

use observe_modifier::{
	render, ArgSources, Args, Binding, BoxError, ClassDefinition, ClassManager, ClassModifier,
	ClassState, Const, Context, Error, Hook, Instance, Lifecycle, ModifierManager, Owner,
	Registry, Var,
};


use mock::{Element, Journal};

type Cx<'a> = Context<'a, Element, String>;
type ClassInstance = Instance<Element, String, ClassState<Element, String>>;

struct Tooltip {
	journal: Rc<Journal>,
	theme: Var<String>,
}

impl ClassModifier<Element, String> for Tooltip {
	fn create(owner: &dyn Owner, args: &Args<String>) -> Result<Self, BoxError> {
		let journal: Rc<Journal> = owner.service("journal")?;
		let theme: Var<String> = owner.service("theme")?;

		let text = args.peek_positional(0).cloned().unwrap_or_default();
		journal.push(format!("create {}", text));

		Ok(Tooltip { journal, theme })
	}

	fn did_receive_arguments(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
		let text = cx.positional().get(0).cloned().unwrap_or_default();
		let theme = (*self.theme.get(cx)).clone();

		if let Some(element) = cx.element() {
			element.set_attribute("title", text.clone());
		}

		self.journal
			.push(format!("did_receive_arguments {} {}", text, theme));
		Ok(())
	}

	fn did_update_arguments(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
		let changes = cx.changes().cloned().unwrap_or_default();
		self.journal.push(format!(
			"did_update_arguments positional={} named={:?}",
			changes.positional,
			changes.named.to_vec()
		));
		Ok(())
	}

	fn did_install(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
		self.journal
			.push(format!("did_install element={}", cx.element().is_some()));
		Ok(())
	}

	fn will_remove(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
		self.journal.push(flags("will_remove", cx));
		Ok(())
	}

	fn will_destroy(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
		self.journal.push(flags("will_destroy", cx));
		Ok(())
	}
}

fn flags(hook: &str, cx: &Cx<'_>) -> String {
	format!(
		"{} destroying={} destroyed={} element={}",
		hook,
		cx.is_destroying(),
		cx.is_destroyed(),
		cx.element().is_some()
	)
}

/// Fails in `did_install` when asked to through the `fail` argument.
struct Picky {
	journal: Rc<Journal>,
}

impl ClassModifier<Element, String> for Picky {
	fn create(owner: &dyn Owner, _args: &Args<String>) -> Result<Self, BoxError> {
		Ok(Picky {
			journal: owner.service("journal")?,
		})
	}

	fn did_install(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
		if cx.named().get("fail").is_some() {
			return Err("element is not focusable".into());
		}
		self.journal.push("did_install");
		Ok(())
	}

	fn will_remove(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
		self.journal.push(flags("will_remove", cx));
		Ok(())
	}

	fn will_destroy(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
		self.journal.push(flags("will_destroy", cx));
		Ok(())
	}
}

fn registry(journal: &Journal, theme: &Var<String>) -> Rc<dyn Owner> {
	Rc::new(
		Registry::new()
			.with("journal", Rc::new(journal.clone()) as Rc<dyn Any>)
			.with("theme", theme.clone().into()),
	)
}

fn bind(
	owner: Rc<dyn Owner>,
	definition: &ClassDefinition<Element, String>,
	sources: ArgSources<String>,
) -> Result<Binding<ClassManager, Element, String>, Error> {
	Binding::create(ClassManager, owner, definition, sources)
}

fn create(
	owner: Rc<dyn Owner>,
	definition: &ClassDefinition<Element, String>,
	args: Args<String>,
) -> Result<ClassInstance, Error> {
	ModifierManager::<Element, String>::create(&ClassManager, owner, definition, args)
}

fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn hooks_run_in_order() {
	let journal = Journal::default();
	let theme = Var::named("theme", "dark".to_string());
	let text = Var::new("hello".to_string());
	let unused = Var::new("unused".to_string());

	let definition = ClassDefinition::named::<Tooltip>("tooltip");
	let element = Element::new("abbr");
	let binding = bind(
		registry(&journal, &theme),
		&definition,
		ArgSources::new()
			.positional(text.clone())
			.named("unused", unused.clone()),
	)
	.unwrap();

	assert_eq!(journal.take(), strings(&["create hello"]));

	render(|| binding.insert(element.clone()).unwrap()).unwrap();
	assert_eq!(
		journal.take(),
		strings(&["did_receive_arguments hello dark", "did_install element=true"])
	);
	assert_eq!(element.attribute("title").as_deref(), Some("hello"));

	render(|| text.set("world".to_string())).unwrap();
	assert_eq!(
		journal.take(),
		strings(&[
			"did_update_arguments positional=true named=[]",
			"did_receive_arguments world dark",
		])
	);
	assert_eq!(element.attribute("title").as_deref(), Some("world"));

	// Read through the context, not an argument: still an update.
	render(|| theme.set("light".to_string())).unwrap();
	assert_eq!(
		journal.take(),
		strings(&[
			"did_update_arguments positional=false named=[]",
			"did_receive_arguments world light",
		])
	);

	render(|| unused.set("still unused".to_string())).unwrap();
	assert!(journal.take().is_empty());

	binding.remove().unwrap();
	assert_eq!(
		journal.take(),
		strings(&[
			"will_remove destroying=true destroyed=false element=true",
			"will_destroy destroying=true destroyed=false element=false",
		])
	);
	assert_eq!(binding.lifecycle().unwrap(), Lifecycle::Destroyed);
	assert!(binding.with(|instance| instance.is_destroyed()).unwrap());
	assert!(binding.with(|instance| instance.element().is_none()).unwrap());

	render(|| text.set("gone".to_string())).unwrap();
	assert!(journal.take().is_empty());
}

#[test]
fn unrelated_changes_run_no_hooks() {
	let journal = Journal::default();
	let theme = Var::new("dark".to_string());

	let definition = ClassDefinition::of::<Tooltip>();
	let element = Element::new("abbr");
	let binding = bind(
		registry(&journal, &theme),
		&definition,
		ArgSources::new().positional(Const::new("static".to_string())),
	)
	.unwrap();
	binding.insert(element.clone()).unwrap();
	journal.take();

	render(|| element.set_attribute("class", "highlighted")).unwrap();
	assert!(journal.take().is_empty());
	assert!(!binding.revalidate().unwrap());
	assert!(journal.take().is_empty());
	assert_eq!(binding.tag().runs(), 1);
}

#[test]
fn several_writes_one_update() {
	let journal = Journal::default();
	let theme = Var::new("dark".to_string());
	let text = Var::new("a".to_string());

	let definition = ClassDefinition::named::<Tooltip>("tooltip");
	let binding = bind(
		registry(&journal, &theme),
		&definition,
		ArgSources::new().positional(text.clone()),
	)
	.unwrap();
	binding.insert(Element::new("abbr")).unwrap();
	journal.take();

	render(|| {
		text.set("b".to_string());
		theme.set("light".to_string());
		text.set("c".to_string());
	})
	.unwrap();

	assert_eq!(
		journal.take(),
		strings(&[
			"did_update_arguments positional=true named=[]",
			"did_receive_arguments c light",
		])
	);
}

#[test]
fn changes_list_named_keys() {
	let journal = Journal::default();
	let theme = Var::new("dark".to_string());
	let size = Var::new("small".to_string());

	struct Badge {
		journal: Rc<Journal>,
	}

	impl ClassModifier<Element, String> for Badge {
		fn create(owner: &dyn Owner, _args: &Args<String>) -> Result<Self, BoxError> {
			Ok(Badge {
				journal: owner.service("journal")?,
			})
		}

		fn did_receive_arguments(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
			let size = cx.named().get("size").cloned().unwrap_or_default();
			self.journal.push(format!("size {}", size));
			Ok(())
		}

		fn did_update_arguments(&mut self, cx: &Cx<'_>) -> Result<(), BoxError> {
			if let Some(changes) = cx.changes() {
				self.journal.push(format!(
					"size changed={} color changed={}",
					changes.named_changed("size"),
					changes.named_changed("color")
				));
			}
			Ok(())
		}
	}

	let definition = ClassDefinition::named::<Badge>("sized");
	let binding = bind(
		registry(&journal, &theme),
		&definition,
		ArgSources::new()
			.named("size", size.clone())
			.named("color", Const::new("red".to_string())),
	)
	.unwrap();
	binding.insert(Element::new("img")).unwrap();

	render(|| size.set("large".to_string())).unwrap();

	assert_eq!(
		journal.take(),
		strings(&[
			"size small",
			"size changed=true color changed=false",
			"size large",
		])
	);

	let changes = binding.with(|instance| instance.state().changes().clone()).unwrap();
	assert!(!changes.positional);
	assert_eq!(changes.named.to_vec(), strings(&["size"]));
}

#[test]
fn construction_failure_installs_nothing() {
	let journal = Journal::default();
	// No theme registered.
	let owner: Rc<dyn Owner> = Rc::new(
		Registry::new().with("journal", Rc::new(journal.clone()) as Rc<dyn Any>),
	);

	let definition = ClassDefinition::named::<Tooltip>("tooltip");
	let err = bind(owner, &definition, ArgSources::new()).err().unwrap();

	assert!(matches!(err, Error::Construction { name: "tooltip", .. }));
	assert_eq!(
		err.source().map(|source| source.to_string()).as_deref(),
		Some("service `theme` is not registered")
	);
	assert!(journal.take().is_empty());
}

#[test]
fn service_of_the_wrong_type() {
	let journal = Journal::default();
	let owner: Rc<dyn Owner> = Rc::new(
		Registry::new()
			.with("journal", Rc::new(journal.clone()) as Rc<dyn Any>)
			.with("theme", Rc::new(42u32) as Rc<dyn Any>),
	);

	let definition = ClassDefinition::named::<Tooltip>("tooltip");
	let err = create(owner, &definition, Args::empty()).err().unwrap();

	assert_eq!(
		err.source().map(|source| source.to_string()).as_deref(),
		Some("service `theme` has an unexpected type")
	);
}

#[test]
fn failed_install_hook() {
	let journal = Journal::default();
	let theme = Var::new("dark".to_string());

	let definition = ClassDefinition::named::<Picky>("picky");
	let mut instance = create(
		registry(&journal, &theme),
		&definition,
		Args::from_values(None::<String>, [("fail", "yes".to_string())]),
	)
	.unwrap();

	let err = ClassManager
		.install(&mut instance, Element::new("div"))
		.unwrap_err();
	assert!(matches!(
		err,
		Error::Hook {
			name: "picky",
			hook: Hook::DidInstall,
			..
		}
	));
	assert_eq!(instance.lifecycle(), Lifecycle::Pending);
	assert!(instance.element().is_none());

	let err = ClassManager
		.install(&mut instance, Element::new("div"))
		.unwrap_err();
	assert!(matches!(err, Error::Aborted { name: "picky" }));

	// Never attached: only the final hook runs.
	ClassManager.destroy(&mut instance).unwrap();
	assert_eq!(
		journal.take(),
		strings(&["will_destroy destroying=true destroyed=false element=false"])
	);
	assert!(instance.is_destroyed());
}

#[test]
fn misuse_is_reported() {
	let journal = Journal::default();
	let theme = Var::new("dark".to_string());

	let definition = ClassDefinition::named::<Picky>("picky");
	let mut instance = create(registry(&journal, &theme), &definition, Args::empty()).unwrap();

	let err = ClassManager
		.update(&mut instance, Args::empty())
		.unwrap_err();
	assert!(matches!(err, Error::NotInstalled { name: "picky" }));

	ClassManager
		.install(&mut instance, Element::new("div"))
		.unwrap();
	ClassManager.destroy(&mut instance).unwrap();
	assert_eq!(
		journal.take(),
		strings(&[
			"did_install",
			"will_remove destroying=true destroyed=false element=true",
			"will_destroy destroying=true destroyed=false element=false",
		])
	);

	let err = ClassManager.destroy(&mut instance).unwrap_err();
	assert!(err.is_misuse());
	assert!(journal.take().is_empty());
}

#[test]
fn manager_is_shared() {
	let journal = Journal::default();
	let theme = Var::new("dark".to_string());
	let owner = registry(&journal, &theme);

	let definition = ClassDefinition::named::<Tooltip>("tooltip");
	let manager = ClassManager;

	let mut first = create(
		owner.clone(),
		&definition,
		Args::from_values(["first".to_string()], None::<(String, String)>),
	)
	.unwrap();
	let mut second = create(
		owner,
		&definition,
		Args::from_values(["second".to_string()], None::<(String, String)>),
	)
	.unwrap();

	manager.install(&mut first, Element::new("a")).unwrap();
	manager.install(&mut second, Element::new("b")).unwrap();
	manager.destroy(&mut first).unwrap();

	assert!(first.is_destroyed());
	assert!(second.is_installed());

	// Shared reads: one write invalidates both, only the live one cares.
	theme.set("light".to_string());
	assert!(!manager.tag(&second).is_valid());
	let args = Args::from_values(["second".to_string()], None::<(String, String)>);
	manager.update(&mut second, args).unwrap();

	assert_eq!(
		journal.take(),
		strings(&[
			"create first",
			"create second",
			"did_receive_arguments first dark",
			"did_install element=true",
			"did_receive_arguments second dark",
			"did_install element=true",
			"will_remove destroying=true destroyed=false element=true",
			"will_destroy destroying=true destroyed=false element=false",
			"did_update_arguments positional=false named=[]",
			"did_receive_arguments second light",
		])
	);
}
